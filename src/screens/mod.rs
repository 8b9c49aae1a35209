pub mod replay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    None,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Intro,
    MainMenu,
    ReplayPlayer,
}

/// What listeners see when the active screen changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenChange {
    pub screen: Screen,
    pub has_child: bool,
}

/// Screens nest: pushing makes the new screen a child of the current one.
#[derive(Debug, Clone)]
pub struct ScreenStack {
    stack: Vec<Screen>,
}

impl ScreenStack {
    pub fn new(root: Screen) -> Self {
        Self { stack: vec![root] }
    }

    pub fn current(&self) -> Screen {
        // The root is never popped.
        self.stack[self.stack.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether the topmost occurrence of `screen` has something pushed on top of it.
    pub fn has_child(&self, screen: Screen) -> bool {
        self.stack
            .iter()
            .rposition(|s| *s == screen)
            .is_some_and(|i| i + 1 < self.stack.len())
    }

    pub fn push(&mut self, screen: Screen) -> ScreenChange {
        self.stack.push(screen);
        self.change()
    }

    /// Leaves the current screen. The root screen cannot be exited.
    pub fn exit(&mut self) -> Option<ScreenChange> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.stack.pop();
        Some(self.change())
    }

    pub fn change(&self) -> ScreenChange {
        let screen = self.current();
        ScreenChange { screen, has_child: self.has_child(screen) }
    }
}
