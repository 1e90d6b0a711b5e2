// Presentation glue for the CLI. The engine itself never formats output.

pub mod report;
