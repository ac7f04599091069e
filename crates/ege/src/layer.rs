//! # Layers
//!
//! Application code plugs into the runtime as a stack of layers. Events go
//! down the stack from the top until a layer consumes them; update, render
//! and exit run bottom to top.
//!
//! ```text
//!   push order        event dispatch       render order
//!   ┌─────────┐            │                    ▲
//!   │  HUD    │ 2          ▼ first              │ last (drawn on top)
//!   ├─────────┤
//!   │  Game   │ 1
//!   ├─────────┤
//!   │  Sky    │ 0          ▼ last               │ first
//!   └─────────┘
//! ```

use ege_core::StaticArena;

use crate::events::Event;
use crate::RenderBuffer;

/// What a layer gets to draw with.
pub struct RenderContext<'a, 'buf> {
    /// Command buffer of the frame being recorded.
    ///
    /// The `push_*` encoders panic when the buffer is full; layers that may
    /// emit many commands should use the `try_push_*` variants.
    pub commands: &'a mut RenderBuffer,
    /// Number of the frame being recorded, from 0.
    pub frame: u64,
    /// Scratch memory, reset every frame.
    pub scratch: &'a StaticArena<'buf>,
}

/// A unit of application behaviour driven by the runtime.
///
/// Every hook has a no-op default.
pub trait Layer {
    /// Name for logs.
    fn name(&self) -> &str {
        "layer"
    }

    /// Handles an event. Returns true to stop it reaching lower layers.
    fn on_event(&mut self, _event: &Event) -> bool {
        false
    }

    /// Advances state by `dt` seconds.
    fn on_update(&mut self, _dt: f32) {}

    /// Records this layer's commands for the frame.
    fn on_render(&mut self, _ctx: &mut RenderContext<'_, '_>) {}

    /// Called once at teardown.
    fn on_exit(&mut self) {}
}

/// Ordered collection of layers, bottom first.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn Layer>>,
}

impl LayerStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a layer on top.
    pub fn push(&mut self, layer: Box<dyn Layer>) {
        tracing::debug!(layer = layer.name(), depth = self.layers.len(), "layer pushed");
        self.layers.push(layer);
    }

    /// Removes the top layer.
    pub fn pop(&mut self) -> Option<Box<dyn Layer>> {
        self.layers.pop()
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if no layer was pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Offers `event` to each layer from the top. Returns true if one
    /// consumed it.
    pub fn dispatch(&mut self, event: &Event) -> bool {
        self.layers
            .iter_mut()
            .rev()
            .any(|layer| layer.on_event(event))
    }

    /// Updates every layer, bottom first.
    pub fn update(&mut self, dt: f32) {
        for layer in &mut self.layers {
            layer.on_update(dt);
        }
    }

    /// Lets every layer record, bottom first, so upper layers draw over
    /// lower ones.
    pub fn render(&mut self, ctx: &mut RenderContext<'_, '_>) {
        for layer in &mut self.layers {
            layer.on_render(ctx);
        }
    }

    /// Calls `on_exit` on every layer, top first.
    pub fn exit(&mut self) {
        for layer in self.layers.iter_mut().rev() {
            layer.on_exit();
        }
    }
}

impl std::fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.layers.iter().map(|layer| layer.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::events::InputEvent;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        consume: bool,
        log: Log,
    }

    impl Layer for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn on_event(&mut self, _event: &Event) -> bool {
            self.log.borrow_mut().push(format!("{}:event", self.name));
            self.consume
        }

        fn on_update(&mut self, _dt: f32) {
            self.log.borrow_mut().push(format!("{}:update", self.name));
        }

        fn on_exit(&mut self) {
            self.log.borrow_mut().push(format!("{}:exit", self.name));
        }
    }

    fn stack(log: &Log, consume_top: bool) -> LayerStack {
        let mut stack = LayerStack::new();
        stack.push(Box::new(Recorder { name: "bottom", consume: false, log: Rc::clone(log) }));
        stack.push(Box::new(Recorder { name: "top", consume: consume_top, log: Rc::clone(log) }));
        stack
    }

    #[test]
    fn test_events_go_top_first_until_consumed() {
        let log: Log = Rc::default();
        let mut layers = stack(&log, true);

        assert!(layers.dispatch(&Event::QUIT));
        assert_eq!(*log.borrow(), vec!["top:event"]);
    }

    #[test]
    fn test_unconsumed_event_reaches_every_layer() {
        let log: Log = Rc::default();
        let mut layers = stack(&log, false);

        let key = Event::Input(InputEvent::Key { code: 32, pressed: true });
        assert!(!layers.dispatch(&key));
        assert_eq!(*log.borrow(), vec!["top:event", "bottom:event"]);
    }

    #[test]
    fn test_update_bottom_first_exit_top_first() {
        let log: Log = Rc::default();
        let mut layers = stack(&log, false);

        layers.update(0.016);
        layers.exit();
        assert_eq!(
            *log.borrow(),
            vec!["bottom:update", "top:update", "top:exit", "bottom:exit"]
        );
    }

    #[test]
    fn test_default_hooks_are_noops() {
        struct Empty;
        impl Layer for Empty {}

        let mut layers = LayerStack::new();
        layers.push(Box::new(Empty));
        assert!(!layers.dispatch(&Event::QUIT));
        layers.update(1.0);
        layers.exit();
        assert_eq!(layers.len(), 1);
        assert!(layers.pop().is_some());
        assert!(layers.is_empty());
    }
}
