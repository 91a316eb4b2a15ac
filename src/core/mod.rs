pub mod component;
pub mod error;
pub mod events;
pub mod sequencer;
pub mod settings;
