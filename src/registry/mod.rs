//! Identity strings for loaders and assemblers
//!
//! A saved session only records which loader and assembler produced it. The
//! registry turns those identity strings back into live plugins.

use crate::arch::{avr8, Assembler};
use crate::platform::{self, BinaryLoader, LoadRequest, Loader};
use std::collections::HashMap;

pub type LoaderFactory = fn(LoadRequest) -> Box<dyn Loader>;
pub type AssemblerFactory = fn() -> Box<dyn Assembler>;

fn avr8_assembler() -> Box<dyn Assembler> {
    Box::new(avr8::Avr8)
}

#[derive(Clone, Debug, Default)]
pub struct Registry {
    loaders: HashMap<String, LoaderFactory>,
    assemblers: HashMap<String, AssemblerFactory>,
}

impl Registry {
    /// A registry that knows no plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every plugin that ships with this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry
            .register_loader(platform::BINARY, BinaryLoader::boxed)
            .register_assembler(avr8::ID, avr8_assembler);

        registry
    }

    /// Register a loader, replacing any previously registered under `id`.
    pub fn register_loader(&mut self, id: &str, factory: LoaderFactory) -> &mut Self {
        self.loaders.insert(id.to_string(), factory);
        self
    }

    pub fn register_assembler(&mut self, id: &str, factory: AssemblerFactory) -> &mut Self {
        self.assemblers.insert(id.to_string(), factory);
        self
    }

    pub fn resolve_loader(&self, id: &str) -> Option<LoaderFactory> {
        self.loaders.get(id).copied()
    }

    pub fn resolve_assembler(&self, id: &str) -> Option<AssemblerFactory> {
        self.assemblers.get(id).copied()
    }

    pub fn loader_ids(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    pub fn assembler_ids(&self) -> impl Iterator<Item = &str> {
        self.assemblers.keys().map(String::as_str)
    }
}
