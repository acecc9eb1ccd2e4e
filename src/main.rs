use std::process::ExitCode;

fn main() -> ExitCode {
    nhrl_bracket_tool_lib::run()
}
