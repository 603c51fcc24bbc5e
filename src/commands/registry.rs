// src/commands/registry.rs
use std::collections::HashMap;
use super::types::Command;

pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(|s| s.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Build a registry with every coreutils-style command the sandbox ships.
    /// `test`/`[`, `true`/`false`/`echo`/`pwd` are registered here too so the
    /// engine can dispatch them through the same path as everything else.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(super::cat::CatCommand));
        registry.register(Box::new(super::cp::CpCommand));
        registry.register(Box::new(super::curl::CurlCommand));
        registry.register(Box::new(super::cut::CutCommand));
        registry.register(Box::new(super::echo::EchoCommand));
        registry.register(Box::new(super::env::EnvCommand));
        registry.register(Box::new(super::env::PrintenvCommand));
        registry.register(Box::new(super::grep::GrepCommand));
        registry.register(Box::new(super::head::HeadCommand));
        registry.register(Box::new(super::jq::JqCommand));
        registry.register(Box::new(super::ls::LsCommand));
        registry.register(Box::new(super::mkdir::MkdirCommand));
        registry.register(Box::new(super::mv::MvCommand));
        registry.register(Box::new(super::printf::PrintfCommand));
        registry.register(Box::new(super::pwd::PwdCommand));
        registry.register(Box::new(super::rm::RmCommand));
        registry.register(Box::new(super::sed::SedCommand));
        registry.register(Box::new(super::sort::SortCommand));
        registry.register(Box::new(super::tail::TailCommand));
        registry.register(Box::new(super::tee::TeeCommand));
        registry.register(Box::new(super::test_cmd::TestCommand));
        registry.register(Box::new(super::test_cmd::BracketCommand));
        registry.register(Box::new(super::tr::TrCommand));
        registry.register(Box::new(super::true_cmd::TrueCommand));
        registry.register(Box::new(super::true_cmd::FalseCommand));
        registry.register(Box::new(super::uniq::UniqCommand));
        registry.register(Box::new(super::wc::WcCommand));
        registry.register(Box::new(super::xargs::XargsCommand));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_defaults_registers_coreutils() {
        let registry = CommandRegistry::with_defaults();
        assert!(registry.contains("cat"));
        assert!(registry.contains("echo"));
        assert!(registry.contains("test"));
        assert!(registry.contains("["));
        assert!(registry.contains("sed"));
        assert!(!registry.contains("nonexistent-command"));
    }
}
