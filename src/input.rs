//! Input actions, strokes and the binding table.
//!
//! Raw device events ([`crate::event::InputEvent`]) never reach nodes directly. They pass
//! through an [`InputMap`], which groups bindings into modifier layers and translates the
//! events into *input actions*: semantic commands like "press" or "focus the next node".
//! Nodes subscribe to actions, not keys, so rebinding never touches node code.

use smallvec::SmallVec;

use crate::event::{EventPhase, InputEvent, InputEventCode, KeyboardKey, MouseButton};
use crate::static_id::StaticId;

/// ID of an input action.
///
/// Each declared action owns a process-wide unique ID; comparing IDs is integer equality.
/// Declare new actions with [`input_action!`](crate::input_action!); the built-in set lives
/// in [`actions`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputActionId(StaticId);

impl InputActionId {
    /// Register a new action. Prefer [`input_action!`](crate::input_action!), which makes the
    /// registration happen exactly once per symbol.
    pub fn allocate(name: &'static str) -> Self {
        Self(StaticId::allocate(name))
    }

    /// Name the action was declared with.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl std::fmt::Debug for InputActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InputActionId({:?})", self.0)
    }
}

/// Declare functions returning [`InputActionId`]s unique to the declared symbols.
///
/// ```
/// trellis_ui::input_action! {
///     /// Toggle the inspector overlay.
///     pub toggle_inspector;
/// }
///
/// assert_eq!(toggle_inspector(), toggle_inspector());
/// ```
#[macro_export]
macro_rules! input_action {
    ($($(#[$attr:meta])* $vis:vis $name:ident;)+) => {
        $(
            $(#[$attr])*
            $vis fn $name() -> $crate::input::InputActionId {
                static ID: ::once_cell::sync::Lazy<$crate::input::InputActionId> =
                    ::once_cell::sync::Lazy::new(|| {
                        $crate::input::InputActionId::allocate(stringify!($name))
                    });
                *ID
            }
        )+
    };
}

/// Default input actions one can listen to.
pub mod actions {
    crate::input_action! {
        // Basic
        /// Press the input. Used for example to activate buttons.
        pub press;
        /// Submit input, e.g. finish writing in a text input.
        pub submit;
        /// Cancel the input.
        pub cancel;
        /// Open a context menu.
        pub context_menu;

        // Focus
        /// Focus the previous input.
        pub focus_previous;
        /// Focus the next input.
        pub focus_next;
        /// Focus the input to the left.
        pub focus_left;
        /// Focus the input to the right.
        pub focus_right;
        /// Focus the input above.
        pub focus_up;
        /// Focus the input below.
        pub focus_down;

        // Text navigation
        /// Start a new text line, place a line feed.
        pub break_line;
        /// Move to the previous character in text.
        pub previous_char;
        /// Move to the next character in text.
        pub next_char;
        /// Move to the previous word in text.
        pub previous_word;
        /// Move to the next word in text.
        pub next_word;
        /// Move to the previous line in text.
        pub previous_line;
        /// Move to the next line in text.
        pub next_line;
        /// Move to the beginning of this line; Home key.
        pub to_line_start;
        /// Move to the end of this line; End key.
        pub to_line_end;
        /// Move to the beginning.
        pub to_start;
        /// Move to the end.
        pub to_end;

        // Editing
        /// Erase the last character in an input.
        pub backspace;
        /// Erase the last word in an input.
        pub backspace_word;
        /// Delete the next character in an input.
        pub delete_char;
        /// Delete the next word in an input.
        pub delete_word;
        /// Copy selected content.
        pub copy;
        /// Cut (copy and delete) selected content.
        pub cut;
        /// Paste selected content.
        pub paste;
        /// Undo the last action.
        pub undo;
        /// Redo the last action; reverse of "undo".
        pub redo;
        /// Select all in text.
        pub select_all;

        // Selection
        /// Select the previous character in text.
        pub select_previous_char;
        /// Select the next character in text.
        pub select_next_char;
        /// Select to the previous line in text.
        pub select_previous_line;
        /// Select to the next line in text.
        pub select_next_line;
        /// Select the previous word in text.
        pub select_previous_word;
        /// Select the next word in text.
        pub select_next_word;
        /// Select from here to the line beginning.
        pub select_to_line_start;
        /// Select from here to the line end.
        pub select_to_line_end;
        /// Select from here to the beginning.
        pub select_to_start;
        /// Select from here to the end.
        pub select_to_end;

        // List navigation
        /// Navigate to the previous list entry.
        pub entry_previous;
        /// Navigate to the next list entry.
        pub entry_next;
        /// Navigate up in a tree, e.g. in a file picker.
        pub entry_up;

        // Scrolling
        /// Scroll left a bit.
        pub scroll_left;
        /// Scroll right a bit.
        pub scroll_right;
        /// Scroll up a bit.
        pub scroll_up;
        /// Scroll down a bit.
        pub scroll_down;
        /// Scroll left by a page. Unbound by default.
        pub page_left;
        /// Scroll right by a page. Unbound by default.
        pub page_right;
        /// Scroll up by a page.
        pub page_up;
        /// Scroll down by a page.
        pub page_down;

        // Internal
        /// Fired once per frame as a fallback tick for focus and hover handlers that are not
        /// bound to any concrete key.
        pub frame_event;
    }
}

/// Represents a key or button input combination.
///
/// The last item of the stroke is its *trigger*; all preceding items are *modifiers* that
/// must be held while the trigger activates. A stroke without items is valid only as a layer
/// modifier set (it matches always); it cannot be bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InputStroke {
    items: SmallVec<[InputEventCode; 4]>,
}

impl InputStroke {
    pub fn new(items: impl IntoIterator<Item = InputEventCode>) -> Self {
        Self { items: items.into_iter().collect() }
    }

    /// A stroke of a single key or button.
    pub fn single(code: impl Into<InputEventCode>) -> Self {
        Self { items: smallvec::smallvec![code.into()] }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn items(&self) -> &[InputEventCode] {
        &self.items
    }

    /// The item that activates the stroke: its last one.
    pub fn trigger(&self) -> Option<InputEventCode> {
        self.items.last().copied()
    }

    /// All items before the trigger.
    pub fn modifiers(&self) -> &[InputEventCode] {
        match self.items.len() {
            0 => &[],
            len => &self.items[..len - 1],
        }
    }
}

impl From<InputEventCode> for InputStroke {
    fn from(code: InputEventCode) -> Self {
        Self::single(code)
    }
}

impl From<KeyboardKey> for InputStroke {
    fn from(key: KeyboardKey) -> Self {
        Self::single(key)
    }
}

impl From<MouseButton> for InputStroke {
    fn from(button: MouseButton) -> Self {
        Self::single(button)
    }
}

impl From<crate::event::GamepadButton> for InputStroke {
    fn from(button: crate::event::GamepadButton) -> Self {
        Self::single(button)
    }
}

/// Binding of an input stroke's trigger to an input action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBinding {
    pub action: InputActionId,
    pub trigger: InputEventCode,
}

/// A layer groups input bindings by common key modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLayer {
    pub modifiers: InputStroke,
    pub bindings: Vec<InputBinding>,
}

impl InputLayer {
    pub fn new(modifiers: InputStroke) -> Self {
        Self { modifiers, bindings: Vec::new() }
    }

    /// True if every modifier of the layer is currently held, per the given query. The empty
    /// modifier set matches always.
    pub fn matches(&self, mut is_held: impl FnMut(InputEventCode) -> bool) -> bool {
        self.modifiers.items().iter().all(|&code| is_held(code))
    }
}

/// The set of all active input bindings, grouped into layers.
///
/// Layers are kept sorted by modifier count, descending, so that a more specific combination
/// always wins over a less specific one; layers with equally many modifiers keep their
/// insertion order. Every mutation preserves the invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputMap {
    layers: Vec<InputLayer>,
}

impl InputMap {
    pub const fn new() -> Self {
        Self { layers: Vec::new() }
    }

    #[inline]
    pub fn layers(&self) -> &[InputLayer] {
        &self.layers
    }

    /// Bind an input stroke to an action, inserting a new layer if none shares the stroke's
    /// modifiers yet.
    pub fn bind_input(&mut self, action: InputActionId, stroke: InputStroke) {
        let Some(trigger) = stroke.trigger() else {
            panic!("cannot bind an empty input stroke");
        };
        let binding = InputBinding { action, trigger };
        self.layer_for(stroke.modifiers()).bindings.push(binding);
    }

    /// Bind an input stroke to an action, first clearing any binding in the same layer that
    /// shares the trigger.
    pub fn bind_input_replace(&mut self, action: InputActionId, stroke: InputStroke) {
        let Some(trigger) = stroke.trigger() else {
            panic!("cannot bind an empty input stroke");
        };
        let layer = self.layer_for(stroke.modifiers());
        layer.bindings.retain(|binding| binding.trigger != trigger);
        layer.bindings.push(InputBinding { action, trigger });
    }

    /// Remove all bindings for the action, across all layers. Layers left without bindings
    /// are dropped.
    pub fn clear_bound_input(&mut self, action: InputActionId) {
        let mut removed = 0;
        for layer in &mut self.layers {
            let before = layer.bindings.len();
            layer.bindings.retain(|binding| binding.action != action);
            removed += before - layer.bindings.len();
        }
        self.layers.retain(|layer| !layer.bindings.is_empty());
        if removed == 0 {
            tracing::warn!(action = action.name(), "cleared an action that was not bound");
        }
    }

    /// The first layer whose every modifier is held. Layers are sorted most-specific first,
    /// and the search stops at the first match, so earlier layers shadow later ones.
    pub fn match_layer(
        &self,
        mut is_held: impl FnMut(InputEventCode) -> bool,
    ) -> Option<&InputLayer> {
        self.layers.iter().find(|layer| layer.matches(&mut is_held))
    }

    /// Find the layer with exactly these modifiers, creating and inserting it at its sorted
    /// position if missing.
    fn layer_for(&mut self, modifiers: &[InputEventCode]) -> &mut InputLayer {
        if let Some(index) = self
            .layers
            .iter()
            .position(|layer| layer.modifiers.items() == modifiers)
        {
            return &mut self.layers[index];
        }

        // Insert after all layers with the same or greater modifier count to keep insertion
        // order among ties.
        let index = self
            .layers
            .iter()
            .position(|layer| layer.modifiers.len() < modifiers.len())
            .unwrap_or(self.layers.len());
        self.layers
            .insert(index, InputLayer::new(InputStroke::new(modifiers.iter().copied())));
        &mut self.layers[index]
    }
}

/// The modifier key combined with letters for shortcuts like copy and paste: Command on
/// macOS, Control everywhere else.
#[cfg(target_os = "macos")]
const PLATFORM_MODIFIERS: [KeyboardKey; 2] = [KeyboardKey::LeftSuper, KeyboardKey::RightSuper];
#[cfg(not(target_os = "macos"))]
const PLATFORM_MODIFIERS: [KeyboardKey; 2] =
    [KeyboardKey::LeftControl, KeyboardKey::RightControl];

const SHIFTS: [KeyboardKey; 2] = [KeyboardKey::LeftShift, KeyboardKey::RightShift];

/// Bind `trigger` under every left/right variant of the given modifier groups.
fn bind_combos(
    map: &mut InputMap,
    action: InputActionId,
    groups: &[&[KeyboardKey]],
    trigger: impl Into<InputEventCode>,
) {
    let trigger = trigger.into();
    // Cartesian product over the groups; each group contributes one of its variants.
    let mut picks = vec![0usize; groups.len()];
    loop {
        let items = picks
            .iter()
            .zip(groups)
            .map(|(&pick, group)| InputEventCode::Keyboard(group[pick]))
            .chain([trigger]);
        map.bind_input(action, InputStroke::new(items));

        // Advance the odometer.
        let mut position = groups.len();
        loop {
            if position == 0 {
                return;
            }
            position -= 1;
            picks[position] += 1;
            if picks[position] < groups[position].len() {
                break;
            }
            picks[position] = 0;
        }
    }
}

/// The default binding table: universal press/cancel controls, tab and positional focus
/// navigation, and the usual text editing shortcuts of each platform.
pub fn default_input_map() -> InputMap {
    use crate::event::GamepadButton;

    let mut map = InputMap::new();
    let shift: &[&[KeyboardKey]] = &[&SHIFTS];
    let platform: &[&[KeyboardKey]] = &[&PLATFORM_MODIFIERS];
    let platform_shift: &[&[KeyboardKey]] = &[&PLATFORM_MODIFIERS, &SHIFTS];

    // Universal
    map.bind_input(actions::press(), MouseButton::Left.into());
    map.bind_input(actions::press(), KeyboardKey::Enter.into());
    map.bind_input(actions::submit(), KeyboardKey::Enter.into());
    map.bind_input(actions::press(), GamepadButton::Cross.into());
    map.bind_input(actions::submit(), GamepadButton::Cross.into());
    map.bind_input(actions::cancel(), KeyboardKey::Escape.into());
    map.bind_input(actions::cancel(), GamepadButton::Circle.into());
    map.bind_input(actions::context_menu(), MouseButton::Right.into());

    // Tab navigation
    map.bind_input(actions::focus_next(), KeyboardKey::Tab.into());
    bind_combos(&mut map, actions::focus_previous(), shift, KeyboardKey::Tab);

    // Directional focus
    map.bind_input(actions::focus_left(), KeyboardKey::Left.into());
    map.bind_input(actions::focus_right(), KeyboardKey::Right.into());
    map.bind_input(actions::focus_up(), KeyboardKey::Up.into());
    map.bind_input(actions::focus_down(), KeyboardKey::Down.into());
    map.bind_input(actions::focus_left(), GamepadButton::DpadLeft.into());
    map.bind_input(actions::focus_right(), GamepadButton::DpadRight.into());
    map.bind_input(actions::focus_up(), GamepadButton::DpadUp.into());
    map.bind_input(actions::focus_down(), GamepadButton::DpadDown.into());

    // Text navigation; shares the arrow keys with directional focus, the handler picks
    // whichever it understands.
    map.bind_input(actions::previous_char(), KeyboardKey::Left.into());
    map.bind_input(actions::next_char(), KeyboardKey::Right.into());
    map.bind_input(actions::previous_line(), KeyboardKey::Up.into());
    map.bind_input(actions::next_line(), KeyboardKey::Down.into());
    map.bind_input(actions::to_line_start(), KeyboardKey::Home.into());
    map.bind_input(actions::to_line_end(), KeyboardKey::End.into());
    map.bind_input(actions::page_up(), KeyboardKey::PageUp.into());
    map.bind_input(actions::page_down(), KeyboardKey::PageDown.into());
    map.bind_input(actions::break_line(), KeyboardKey::Enter.into());

    // Editing
    map.bind_input(actions::backspace(), KeyboardKey::Backspace.into());
    map.bind_input(actions::delete_char(), KeyboardKey::Delete.into());
    bind_combos(&mut map, actions::backspace_word(), platform, KeyboardKey::Backspace);
    bind_combos(&mut map, actions::delete_word(), platform, KeyboardKey::Delete);
    bind_combos(&mut map, actions::copy(), platform, KeyboardKey::C);
    bind_combos(&mut map, actions::cut(), platform, KeyboardKey::X);
    bind_combos(&mut map, actions::paste(), platform, KeyboardKey::V);
    bind_combos(&mut map, actions::undo(), platform, KeyboardKey::Z);
    bind_combos(&mut map, actions::redo(), platform_shift, KeyboardKey::Z);
    bind_combos(&mut map, actions::select_all(), platform, KeyboardKey::A);

    // Word and line skips
    bind_combos(&mut map, actions::previous_word(), platform, KeyboardKey::Left);
    bind_combos(&mut map, actions::next_word(), platform, KeyboardKey::Right);
    bind_combos(&mut map, actions::to_start(), platform, KeyboardKey::Home);
    bind_combos(&mut map, actions::to_end(), platform, KeyboardKey::End);

    // Selection
    bind_combos(&mut map, actions::select_previous_char(), shift, KeyboardKey::Left);
    bind_combos(&mut map, actions::select_next_char(), shift, KeyboardKey::Right);
    bind_combos(&mut map, actions::select_previous_line(), shift, KeyboardKey::Up);
    bind_combos(&mut map, actions::select_next_line(), shift, KeyboardKey::Down);
    bind_combos(&mut map, actions::select_to_line_start(), shift, KeyboardKey::Home);
    bind_combos(&mut map, actions::select_to_line_end(), shift, KeyboardKey::End);
    bind_combos(&mut map, actions::select_previous_word(), platform_shift, KeyboardKey::Left);
    bind_combos(&mut map, actions::select_next_word(), platform_shift, KeyboardKey::Right);
    bind_combos(&mut map, actions::select_to_start(), platform_shift, KeyboardKey::Home);
    bind_combos(&mut map, actions::select_to_end(), platform_shift, KeyboardKey::End);

    // Emacs and vim conventions, except on macOS where Control is free for the system.
    #[cfg(not(target_os = "macos"))]
    {
        let control: &[&[KeyboardKey]] =
            &[&[KeyboardKey::LeftControl, KeyboardKey::RightControl]];
        bind_combos(&mut map, actions::backspace_word(), control, KeyboardKey::W);
        bind_combos(&mut map, actions::entry_previous(), control, KeyboardKey::K);
        bind_combos(&mut map, actions::entry_next(), control, KeyboardKey::J);
        bind_combos(&mut map, actions::entry_previous(), control, KeyboardKey::P);
        bind_combos(&mut map, actions::entry_next(), control, KeyboardKey::N);
    }

    map
}

/// Per-frame result of matching the device state against an [`InputMap`]: the bindings whose
/// triggers are down, and the subset that activated this frame.
#[derive(Debug, Clone, Default)]
pub struct FrameActions {
    /// Bindings whose trigger is currently held.
    pub held: Vec<InputBinding>,

    /// Bindings whose trigger became active this frame: pressed for keyboards and gamepads,
    /// released for mouse buttons.
    pub active: Vec<InputBinding>,
}

/// Tracks which codes are down across frames and evaluates the input map once per frame.
///
/// Mouse triggers count as held for one frame past their release, so that bindings firing on
/// release still see the trigger as part of the held set.
#[derive(Debug, Default)]
pub struct InputState {
    down: Vec<InputEventCode>,
    released: Vec<InputEventCode>,
    active: Vec<InputEventCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event of the current frame.
    pub fn record(&mut self, event: InputEvent) {
        match event.phase {
            EventPhase::Press | EventPhase::Hold => {
                if !self.down.contains(&event.code) {
                    self.down.push(event.code);
                }
            }
            EventPhase::Release => {
                self.down.retain(|&code| code != event.code);
                self.released.push(event.code);
            }
        }
        if event.is_active() && !self.active.contains(&event.code) {
            self.active.push(event.code);
        }
    }

    /// True if the code is held, counting the one-frame grace period after a mouse release.
    pub fn is_held(&self, code: InputEventCode) -> bool {
        self.down.contains(&code) || self.released.contains(&code)
    }

    /// Evaluate the input map against the recorded state.
    pub fn evaluate(&self, map: &InputMap) -> FrameActions {
        let mut result = FrameActions::default();
        let Some(layer) = map.match_layer(|code| self.is_held(code)) else {
            return result;
        };
        for &binding in &layer.bindings {
            if self.is_held(binding.trigger) {
                result.held.push(binding);
            }
            if self.active.contains(&binding.trigger) {
                result.active.push(binding);
            }
        }
        result
    }

    /// Forget the frame-scoped state; held keys carry over.
    pub fn next_frame(&mut self) {
        self.released.clear();
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::GamepadButton;

    fn modifier_lengths(map: &InputMap) -> Vec<usize> {
        map.layers().iter().map(|layer| layer.modifiers.len()).collect()
    }

    #[test]
    fn layers_stay_sorted_through_mutations() {
        let mut map = InputMap::new();
        map.bind_input(actions::press(), KeyboardKey::Enter.into());
        map.bind_input(
            actions::redo(),
            InputStroke::new([
                KeyboardKey::LeftControl.into(),
                KeyboardKey::LeftShift.into(),
                KeyboardKey::Z.into(),
            ]),
        );
        map.bind_input(
            actions::copy(),
            InputStroke::new([KeyboardKey::LeftControl.into(), KeyboardKey::C.into()]),
        );
        map.bind_input(
            actions::undo(),
            InputStroke::new([KeyboardKey::LeftControl.into(), KeyboardKey::Z.into()]),
        );
        assert_eq!(modifier_lengths(&map), [2, 1, 0]);

        map.clear_bound_input(actions::redo());
        assert_eq!(modifier_lengths(&map), [1, 0]);

        map.bind_input(
            actions::cancel(),
            InputStroke::new([KeyboardKey::LeftAlt.into(), KeyboardKey::F4.into()]),
        );
        assert_eq!(modifier_lengths(&map), [1, 1, 0]);
        // Ties keep insertion order.
        assert_eq!(
            map.layers()[0].modifiers.items(),
            [InputEventCode::Keyboard(KeyboardKey::LeftControl)]
        );
    }

    #[test]
    fn default_map_is_sorted() {
        let map = default_input_map();
        let lengths = modifier_lengths(&map);
        let mut sorted = lengths.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lengths, sorted);
    }

    #[test]
    fn specific_layer_shadows_general() {
        let mut map = InputMap::new();
        map.bind_input(actions::press(), KeyboardKey::C.into());
        map.bind_input(
            actions::copy(),
            InputStroke::new([KeyboardKey::LeftControl.into(), KeyboardKey::C.into()]),
        );

        let mut state = InputState::new();
        state.record(InputEvent::new(KeyboardKey::LeftControl, EventPhase::Hold));
        state.record(InputEvent::new(KeyboardKey::C, EventPhase::Press));
        let frame = state.evaluate(&map);
        assert_eq!(frame.active.len(), 1);
        assert_eq!(frame.active[0].action, actions::copy());
    }

    #[test]
    fn bind_replace_clears_conflicts() {
        let mut map = InputMap::new();
        map.bind_input(actions::press(), KeyboardKey::Enter.into());
        map.bind_input(actions::submit(), KeyboardKey::Enter.into());
        map.bind_input_replace(actions::cancel(), KeyboardKey::Enter.into());
        assert_eq!(map.layers().len(), 1);
        assert_eq!(map.layers()[0].bindings.len(), 1);
        assert_eq!(map.layers()[0].bindings[0].action, actions::cancel());
    }

    #[test]
    fn mouse_trigger_held_through_release_frame() {
        let mut map = InputMap::new();
        map.bind_input(actions::press(), MouseButton::Left.into());

        let mut state = InputState::new();
        state.record(InputEvent::new(MouseButton::Left, EventPhase::Press));
        let frame = state.evaluate(&map);
        assert_eq!(frame.active.len(), 0);
        assert_eq!(frame.held.len(), 1);

        state.next_frame();
        state.record(InputEvent::new(MouseButton::Left, EventPhase::Release));
        let frame = state.evaluate(&map);
        assert_eq!(frame.active.len(), 1);
        assert_eq!(frame.active[0].action, actions::press());
        // The trigger still counts as held on its release frame.
        assert_eq!(frame.held.len(), 1);

        state.next_frame();
        let frame = state.evaluate(&map);
        assert!(frame.active.is_empty());
        assert!(frame.held.is_empty());
    }

    #[test]
    #[should_panic(expected = "empty input stroke")]
    fn empty_strokes_cannot_be_bound() {
        let mut map = InputMap::new();
        map.bind_input(actions::press(), InputStroke::default());
    }

    #[test]
    fn gamepad_activates_on_press() {
        let mut map = InputMap::new();
        map.bind_input(actions::press(), GamepadButton::Cross.into());
        let mut state = InputState::new();
        state.record(InputEvent::new(GamepadButton::Cross, EventPhase::Press));
        assert_eq!(state.evaluate(&map).active.len(), 1);
    }
}
