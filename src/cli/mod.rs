// Command-line surface: the clap definitions and the value enums shared with
// `config.yaml`.

pub mod cmd_enums;
pub mod type_enums;
