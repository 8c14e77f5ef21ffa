pub mod bootstrap;
pub mod key;
pub mod token;
