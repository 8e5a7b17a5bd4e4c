mod state;

pub use state::{read_snapshot, App, InputMode, PageDirection};
