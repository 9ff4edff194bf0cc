//! The control panel: buttons offered by the latest bot message and the one
//! menu that may be open at a time.

use sofa_proto::{ButtonEffect, Command, Control, ControlGroup, LocalEffect};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("no offered control at index {0}")]
    Offered(usize),
    #[error("no entry at index {0} in the open menu")]
    MenuEntry(usize),
    #[error("no menu is open")]
    NoOpenMenu,
}

/// Which control the user pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRef {
    /// Top-level control, by position.
    Offered(usize),
    /// Entry of the currently open menu, by position.
    Menu(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// A group's menu is now open (any previously open menu is closed).
    MenuOpened(ControlGroup),
    MenuClosed,
    /// Encode and send this command. The panel has been cleared.
    Send(Command),
    /// Perform this effect locally; nothing is sent.
    Local(LocalEffect),
    /// Nothing to do (no value, or the menu depth limit was reached).
    Inert,
}

#[derive(Debug, Clone, Default)]
pub struct ControlPanel {
    offered: Vec<Control>,
    /// Indices from `offered` down to the open group; empty when closed.
    open_path: Vec<usize>,
    max_menu_depth: usize,
}

impl ControlPanel {
    pub fn new(max_menu_depth: usize) -> Self {
        Self {
            max_menu_depth,
            ..Self::default()
        }
    }

    /// Replace the offered controls and close any open menu.
    pub fn offer(&mut self, controls: Vec<Control>) {
        self.offered = controls;
        self.open_path.clear();
    }

    pub fn clear(&mut self) {
        self.offer(Vec::new());
    }

    pub fn offered(&self) -> &[Control] {
        &self.offered
    }

    pub fn is_empty(&self) -> bool {
        self.offered.is_empty()
    }

    pub fn open_menu(&self) -> Option<&ControlGroup> {
        let (first, rest) = self.open_path.split_first()?;
        let mut group = match self.offered.get(*first)? {
            Control::Group(group) => group,
            Control::Button(_) => return None,
        };
        for index in rest {
            group = match group.subcontrols.get(*index)? {
                Control::Group(group) => group,
                Control::Button(_) => return None,
            };
        }
        Some(group)
    }

    pub fn activate(&mut self, target: ControlRef) -> Result<Activation, ControlError> {
        let (control, path) = match target {
            ControlRef::Offered(index) => {
                let control = self
                    .offered
                    .get(index)
                    .cloned()
                    .ok_or(ControlError::Offered(index))?;
                (control, vec![index])
            }
            ControlRef::Menu(index) => {
                let menu = self.open_menu().ok_or(ControlError::NoOpenMenu)?;
                let control = menu
                    .subcontrols
                    .get(index)
                    .cloned()
                    .ok_or(ControlError::MenuEntry(index))?;
                let mut path = self.open_path.clone();
                path.push(index);
                (control, path)
            }
        };

        match control {
            Control::Group(group) => Ok(self.toggle_menu(group, path)),
            Control::Button(button) => match button.effect() {
                ButtonEffect::Command(value) => {
                    debug!(label = %button.label, "control sends command");
                    self.clear();
                    Ok(Activation::Send(Command {
                        value,
                        body: Some(button.label),
                    }))
                }
                ButtonEffect::Local(effect) => Ok(Activation::Local(effect)),
                ButtonEffect::Inert => Ok(Activation::Inert),
            },
        }
    }

    fn toggle_menu(&mut self, group: ControlGroup, path: Vec<usize>) -> Activation {
        if self.open_path == path {
            self.open_path.clear();
            return Activation::MenuClosed;
        }
        if path.len() > self.max_menu_depth {
            debug!(depth = path.len(), "menu depth limit reached");
            return Activation::Inert;
        }
        self.open_path = path;
        Activation::MenuOpened(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sofa_proto::{Button, ControlValue, LocalEffectKind};

    fn group(label: &str, subcontrols: Vec<Control>) -> Control {
        Control::Group(ControlGroup {
            label: label.into(),
            subcontrols,
        })
    }

    fn button(label: &str, value: &str) -> Control {
        Control::Button(Button::new(label).with_value(value))
    }

    fn panel() -> ControlPanel {
        let mut panel = ControlPanel::new(2);
        panel.offer(vec![
            button("Yes", "yes"),
            group("Tips", vec![button("$1", "tip-1"), group("More", vec![button("$50", "tip-50")])]),
            group("Help", vec![Control::Button(
                Button::new("Docs").with_action("Webview::https://example.org/docs"),
            )]),
        ]);
        panel
    }

    #[test]
    fn command_button_is_one_shot() {
        let mut panel = panel();
        let activation = panel.activate(ControlRef::Offered(0)).unwrap();
        assert_eq!(
            activation,
            Activation::Send(Command {
                value: ControlValue::from("yes"),
                body: Some("Yes".into()),
            })
        );
        assert!(panel.is_empty());
        assert_eq!(
            panel.activate(ControlRef::Offered(0)),
            Err(ControlError::Offered(0))
        );
    }

    #[test]
    fn opening_second_group_closes_first() {
        let mut panel = panel();
        assert!(matches!(
            panel.activate(ControlRef::Offered(1)).unwrap(),
            Activation::MenuOpened(ref g) if g.label == "Tips"
        ));
        assert!(matches!(
            panel.activate(ControlRef::Offered(2)).unwrap(),
            Activation::MenuOpened(ref g) if g.label == "Help"
        ));
        assert_eq!(panel.open_menu().unwrap().label, "Help");
    }

    #[test]
    fn activating_open_group_closes_it() {
        let mut panel = panel();
        panel.activate(ControlRef::Offered(1)).unwrap();
        assert_eq!(
            panel.activate(ControlRef::Offered(1)).unwrap(),
            Activation::MenuClosed
        );
        assert!(panel.open_menu().is_none());
    }

    #[test]
    fn menu_entries_send_commands() {
        let mut panel = panel();
        panel.activate(ControlRef::Offered(1)).unwrap();
        let activation = panel.activate(ControlRef::Menu(0)).unwrap();
        assert!(matches!(activation, Activation::Send(_)));
        assert!(panel.is_empty());
        assert!(panel.open_menu().is_none());
    }

    #[test]
    fn nested_groups_descend_until_depth_limit() {
        let mut panel = panel();
        panel.activate(ControlRef::Offered(1)).unwrap();
        assert!(matches!(
            panel.activate(ControlRef::Menu(1)).unwrap(),
            Activation::MenuOpened(ref g) if g.label == "More"
        ));
        assert_eq!(panel.open_menu().unwrap().label, "More");

        let mut shallow = ControlPanel::new(1);
        shallow.offer(panel.offered().to_vec());
        shallow.activate(ControlRef::Offered(1)).unwrap();
        assert_eq!(shallow.activate(ControlRef::Menu(1)).unwrap(), Activation::Inert);
        assert_eq!(shallow.open_menu().unwrap().label, "Tips");
    }

    #[test]
    fn local_effect_leaves_panel_alone() {
        let mut panel = panel();
        panel.activate(ControlRef::Offered(2)).unwrap();
        let activation = panel.activate(ControlRef::Menu(0)).unwrap();
        assert_eq!(
            activation,
            Activation::Local(
                LocalEffect::new(LocalEffectKind::Webview, "https://example.org/docs").unwrap()
            )
        );
        assert_eq!(panel.offered().len(), 3);
        assert_eq!(panel.open_menu().unwrap().label, "Help");
    }

    #[test]
    fn menu_ref_without_open_menu_fails() {
        let mut panel = panel();
        assert_eq!(
            panel.activate(ControlRef::Menu(0)),
            Err(ControlError::NoOpenMenu)
        );
    }

    #[test]
    fn offering_new_controls_closes_menu() {
        let mut panel = panel();
        panel.activate(ControlRef::Offered(1)).unwrap();
        panel.offer(vec![button("Ok", "ok")]);
        assert!(panel.open_menu().is_none());
        assert_eq!(panel.offered().len(), 1);
    }

    #[test]
    fn empty_value_button_sends_nothing() {
        let mut panel = ControlPanel::new(2);
        panel.offer(vec![button("Blank", "")]);
        assert_eq!(
            panel.activate(ControlRef::Offered(0)).unwrap(),
            Activation::Inert
        );
        assert_eq!(panel.offered().len(), 1);
    }
}
