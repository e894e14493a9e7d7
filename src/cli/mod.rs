mod root;
mod schema;
mod simulate;

pub use root::Cli;
pub use schema::SchemaCommand;
pub use simulate::SimulateCommand;
