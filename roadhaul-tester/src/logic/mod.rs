pub mod policy;
pub mod reports;
pub mod simulation;
pub mod storage;

pub use policy::GameplayStrategy;
pub use reports::{write_console_report, write_json_report, write_markdown_report};
pub use simulation::{RunRecord, SimulationConfig, run_simulation};
pub use storage::FileStorage;
