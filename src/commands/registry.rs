//! Name → handler mapping, grounded on the teacher's
//! `commands::registry::CommandRegistry`.

use std::collections::HashMap;
use std::sync::Arc;

use super::types::Command;

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: HashMap::new() }
    }

    pub fn register(&mut self, cmd: Arc<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    /// Register an existing handler under an additional name, e.g. the
    /// `[` alias for `test`. Dispatch keys on the map entry, not on
    /// `Command::name()`, so this is safe even though the handler's own
    /// `name()` still reports its primary name.
    pub fn alias(&mut self, extra_name: &str, cmd: Arc<dyn Command>) {
        self.commands.insert(extra_name.to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }
}
