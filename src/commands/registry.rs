//! Command Registry
//!
//! Name -> implementation map the executor dispatches through after
//! functions and shell builtins.

use std::collections::HashMap;

use super::Command;

pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: HashMap::new() }
    }

    /// The full sandbox command set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for command in default_commands() {
            registry.register(command);
        }
        registry
    }

    pub fn register(&mut self, command: Box<dyn Command>) {
        self.commands.insert(command.name().to_string(), command);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_commands() -> Vec<Box<dyn Command>> {
    vec![
        Box::new(super::awk::AwkCommand),
        Box::new(super::base64_cmd::Base64Command),
        Box::new(super::basename::BasenameCommand),
        Box::new(super::cat::CatCommand),
        Box::new(super::chmod::ChmodCommand),
        Box::new(super::cp::CpCommand),
        Box::new(super::curl::CurlCommand),
        Box::new(super::cut::CutCommand),
        Box::new(super::date::DateCommand),
        Box::new(super::dirname::DirnameCommand),
        Box::new(super::echo::EchoCommand),
        Box::new(super::env_cmd::EnvCommand),
        Box::new(super::find::FindCommand),
        Box::new(super::grep::GrepCommand),
        Box::new(super::head::HeadCommand),
        Box::new(super::jq::JqCommand),
        Box::new(super::ln::LnCommand),
        Box::new(super::ls::LsCommand),
        Box::new(super::mkdir::MkdirCommand),
        Box::new(super::mv::MvCommand),
        Box::new(super::printf::PrintfCommand),
        Box::new(super::pwd::PwdCommand),
        Box::new(super::readlink_cmd::ReadlinkCommand),
        Box::new(super::rev::RevCommand),
        Box::new(super::rm::RmCommand),
        Box::new(super::rmdir::RmdirCommand),
        Box::new(super::sed::SedCommand),
        Box::new(super::seq::SeqCommand),
        Box::new(super::sleep_cmd::SleepCommand),
        Box::new(super::sort::SortCommand),
        Box::new(super::tac::TacCommand),
        Box::new(super::tail::TailCommand),
        Box::new(super::test_cmd::TestCommand::bracket()),
        Box::new(super::test_cmd::TestCommand::plain()),
        Box::new(super::touch::TouchCommand),
        Box::new(super::tr::TrCommand),
        Box::new(super::true_cmd::FalseCommand),
        Box::new(super::true_cmd::TrueCommand),
        Box::new(super::uniq::UniqCommand),
        Box::new(super::wc::WcCommand),
    ]
}
