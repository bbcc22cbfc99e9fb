// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resource limits for the engine and VM.

/// Default operand stack capacity, in values.
pub const DEFAULT_STACK_SIZE: usize = 2048;
/// Default globals store capacity, in slots.
pub const DEFAULT_GLOBALS_SIZE: usize = 65536;
/// Default maximum call depth, counting the top-level frame.
pub const DEFAULT_MAX_FRAMES: usize = 1024;
/// Deepest expression nesting the parser and compiler accept.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Engine configuration.
///
/// ```rust
/// use tamarin_core::EngineConfig;
///
/// let config = EngineConfig::default().with_max_frames(64);
/// assert_eq!(config.max_frames, 64);
/// assert_eq!(config.stack_size, 2048);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Operand stack capacity
    pub stack_size: usize,
    /// Globals store capacity
    pub globals_size: usize,
    /// Maximum number of live call frames
    pub max_frames: usize,
}

impl EngineConfig {
    /// Sets the operand stack capacity.
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Sets the globals store capacity.
    pub fn with_globals_size(mut self, globals_size: usize) -> Self {
        self.globals_size = globals_size;
        self
    }

    /// Sets the maximum call depth.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            globals_size: DEFAULT_GLOBALS_SIZE,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}
