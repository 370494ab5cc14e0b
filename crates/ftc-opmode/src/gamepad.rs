// Copyright 2025 FTC RobotCore Contributors
// SPDX-License-Identifier: Apache-2.0

//! Gamepad snapshots and pending output effects
//!
//! The user-visible gamepads are long-lived objects: new controller data is
//! copied *into* them with [`Gamepad::copy_from`], never swapped in. Anything
//! the user queued on a gamepad (rumble, LED) survives the copy.

use bitflags::bitflags;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// A gamepad shared between the driver thread and user code
pub type SharedGamepad = Arc<Mutex<Gamepad>>;

bitflags! {
    /// Digital buttons of a Driver Station controller
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Buttons: u32 {
        const A = 1 << 0;
        const B = 1 << 1;
        const X = 1 << 2;
        const Y = 1 << 3;
        const DPAD_UP = 1 << 4;
        const DPAD_DOWN = 1 << 5;
        const DPAD_LEFT = 1 << 6;
        const DPAD_RIGHT = 1 << 7;
        const LEFT_BUMPER = 1 << 8;
        const RIGHT_BUMPER = 1 << 9;
        const LEFT_STICK_BUTTON = 1 << 10;
        const RIGHT_STICK_BUTTON = 1 << 11;
        const BACK = 1 << 12;
        const START = 1 << 13;
        const GUIDE = 1 << 14;
        const TOUCHPAD = 1 << 15;
    }
}

/// Which Driver Station slot a gamepad is bound to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadUser {
    #[default]
    Unassigned,
    One,
    Two,
}

/// Analog stick position, each axis in `-1.0..=1.0`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stick {
    pub x: f32,
    pub y: f32,
}

impl Stick {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(-1.0, 1.0),
            y: y.clamp(-1.0, 1.0),
        }
    }

    pub fn is_centered(&self, dead_zone: f32) -> bool {
        self.x.abs() <= dead_zone && self.y.abs() <= dead_zone
    }
}

/// Output effect queued by user code, drained by the host
#[derive(Debug, Clone, PartialEq)]
pub enum GamepadEffect {
    Rumble {
        left: f32,
        right: f32,
        duration: Duration,
    },
    Led {
        red: f32,
        green: f32,
        blue: f32,
        duration: Duration,
    },
}

/// Latest known state of one controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gamepad {
    /// Controller id assigned by the Driver Station
    pub id: i32,
    pub user: GamepadUser,
    /// Driver Station timestamp of this snapshot, in milliseconds
    pub timestamp_ms: u64,
    pub left_stick: Stick,
    pub right_stick: Stick,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub buttons: Buttons,

    #[serde(skip)]
    effects: VecDeque<GamepadEffect>,
}

impl Gamepad {
    /// Dead zone used by [`Gamepad::at_rest`]
    pub const AT_REST_DEAD_ZONE: f32 = 0.05;

    pub fn new(user: GamepadUser) -> Self {
        Self {
            user,
            ..Self::default()
        }
    }

    /// Wrap in the shared handle handed to user code
    pub fn shared(self) -> SharedGamepad {
        Arc::new(Mutex::new(self))
    }

    /// Copy every input field from `other`, keeping this gamepad's pending effects
    pub fn copy_from(&mut self, other: &Gamepad) {
        self.id = other.id;
        self.user = other.user;
        self.timestamp_ms = other.timestamp_ms;
        self.left_stick = other.left_stick;
        self.right_stick = other.right_stick;
        self.left_trigger = other.left_trigger;
        self.right_trigger = other.right_trigger;
        self.buttons = other.buttons;
    }

    pub fn is_pressed(&self, buttons: Buttons) -> bool {
        self.buttons.contains(buttons)
    }

    pub fn set_button(&mut self, button: Buttons, pressed: bool) {
        self.buttons.set(button, pressed);
    }

    /// True if no stick, trigger or button is in use
    pub fn at_rest(&self) -> bool {
        self.left_stick.is_centered(Self::AT_REST_DEAD_ZONE)
            && self.right_stick.is_centered(Self::AT_REST_DEAD_ZONE)
            && self.left_trigger.abs() <= Self::AT_REST_DEAD_ZONE
            && self.right_trigger.abs() <= Self::AT_REST_DEAD_ZONE
            && self.buttons.is_empty()
    }

    /// Queue a rumble; motor powers are clamped to `0.0..=1.0`
    pub fn rumble(&mut self, left: f32, right: f32, duration: Duration) {
        self.effects.push_back(GamepadEffect::Rumble {
            left: left.clamp(0.0, 1.0),
            right: right.clamp(0.0, 1.0),
            duration,
        });
    }

    /// Queue an LED color change; channels are clamped to `0.0..=1.0`
    pub fn set_led_color(&mut self, red: f32, green: f32, blue: f32, duration: Duration) {
        self.effects.push_back(GamepadEffect::Led {
            red: red.clamp(0.0, 1.0),
            green: green.clamp(0.0, 1.0),
            blue: blue.clamp(0.0, 1.0),
            duration,
        });
    }

    pub fn pending_effects(&self) -> impl Iterator<Item = &GamepadEffect> {
        self.effects.iter()
    }

    /// Drain queued effects for transmission
    pub fn take_effects(&mut self) -> Vec<GamepadEffect> {
        self.effects.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driven_pad() -> Gamepad {
        let mut pad = Gamepad::new(GamepadUser::One);
        pad.id = 7;
        pad.timestamp_ms = 1234;
        pad.left_stick = Stick::new(0.5, -0.25);
        pad.right_trigger = 0.8;
        pad.set_button(Buttons::A | Buttons::DPAD_UP, true);
        pad
    }

    #[test]
    fn test_copy_from_preserves_effects() {
        let mut live = Gamepad::new(GamepadUser::One);
        live.rumble(1.0, 1.0, Duration::from_millis(250));

        live.copy_from(&driven_pad());

        assert_eq!(live.id, 7);
        assert_eq!(live.left_stick, Stick::new(0.5, -0.25));
        assert!(live.is_pressed(Buttons::A));
        assert_eq!(live.pending_effects().count(), 1);
    }

    #[test]
    fn test_copy_from_ignores_source_effects() {
        let mut source = driven_pad();
        source.set_led_color(1.0, 0.0, 0.0, Duration::from_secs(1));

        let mut live = Gamepad::default();
        live.copy_from(&source);
        assert_eq!(live.pending_effects().count(), 0);
    }

    #[test]
    fn test_stick_clamps() {
        let stick = Stick::new(2.0, -3.0);
        assert_eq!(stick, Stick { x: 1.0, y: -1.0 });
    }

    #[test]
    fn test_at_rest() {
        assert!(Gamepad::default().at_rest());
        assert!(!driven_pad().at_rest());
    }

    #[test]
    fn test_take_effects_drains_in_order() {
        let mut pad = Gamepad::default();
        pad.rumble(2.0, 0.5, Duration::from_millis(100));
        pad.set_led_color(0.0, 1.0, 0.0, Duration::from_millis(200));

        let effects = pad.take_effects();
        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], GamepadEffect::Rumble { left, .. } if left == 1.0));
        assert_eq!(pad.pending_effects().count(), 0);
    }

    #[test]
    fn test_snapshot_serializes_without_effects() {
        let mut pad = driven_pad();
        pad.rumble(1.0, 1.0, Duration::from_millis(10));

        let json = serde_json::to_string(&pad).unwrap();
        let decoded: Gamepad = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, 7);
        assert!(decoded.is_pressed(Buttons::DPAD_UP));
        assert_eq!(decoded.pending_effects().count(), 0);
    }
}
