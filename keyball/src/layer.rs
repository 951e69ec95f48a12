//! Drive the click layer of a keyberon layout through a virtual key

use crate::hw::LayerControl;
use crate::log::*;
use core::fmt::Debug;
use keyberon::layout::{Event, Layout};

/// Holds a virtual key whose action, on the base layer, is a momentary
/// switch to the click layer
pub struct KeyberonLayers<const C: usize, const R: usize, const L: usize, T: 'static + Debug> {
    /// Keyberon layout
    pub layout: Layout<C, R, L, T>,
    /// Position of the virtual key, (row, column)
    key: (u8, u8),
    /// Layer reached by the virtual key
    layer: u8,
    /// Virtual key is held
    active: bool,
}

impl<const C: usize, const R: usize, const L: usize, T> KeyberonLayers<C, R, L, T>
where
    T: 'static + Debug,
{
    /// Create a new layer adapter
    pub fn new(layout: Layout<C, R, L, T>, key: (u8, u8), layer: u8) -> Self {
        Self {
            layout,
            key,
            layer,
            active: false,
        }
    }

    /// Whether the virtual key is held
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl<const C: usize, const R: usize, const L: usize, T: 'static + Debug> LayerControl
    for KeyberonLayers<C, R, L, T>
{
    fn set_layer(&mut self, layer: u8, active: bool) {
        if layer != self.layer {
            warn!("No virtual key for layer {}", layer);
            return;
        }
        if self.active == active {
            return;
        }
        self.active = active;
        let (i, j) = self.key;
        if active {
            info!("Set Mouse Active");
            self.layout.event(Event::Press(i, j));
        } else {
            info!("Set Mouse Inactive");
            self.layout.event(Event::Release(i, j));
        }
    }

    fn current_layer(&self) -> u8 {
        self.layout.current_layer() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyberon::key_code::KeyCode;

    #[rustfmt::skip]
    static LAYERS: keyberon::layout::Layers<3, 1, 2, ()> = keyberon::layout::layout! {
        { [ A  B  (1) ] }
        { [ n  C   t  ] }
    };

    #[test]
    fn test_virtual_key_switches_layer() {
        crate::log::init_test_logger();
        let mut kl = KeyberonLayers::new(Layout::new(&LAYERS), (0, 2), 1);
        kl.layout.tick();
        assert_eq!(kl.current_layer(), 0);

        kl.set_layer(1, true);
        kl.layout.tick();
        assert_eq!(kl.current_layer(), 1);
        assert!(kl.is_active());
        // a real key now reads from the click layer
        kl.layout.event(Event::Press(0, 1));
        kl.layout.tick();
        assert!(kl.layout.keycodes().any(|k| k == KeyCode::C));
        kl.layout.event(Event::Release(0, 1));
        kl.layout.tick();

        // a second activation does not press the key twice
        kl.set_layer(1, true);
        kl.set_layer(2, false);
        kl.set_layer(1, false);
        kl.layout.tick();
        assert_eq!(kl.current_layer(), 0);
        assert!(!kl.is_active());
    }
}
