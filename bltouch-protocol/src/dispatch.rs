//! Line dispatch
//!
//! Routes one received line through the plugin the way the host's G-code
//! front end would: `$` lines go to the system command handler, anything
//! else is tokenized and run through check, validate and execute.

use bltouch_hal::{LogSink, ProbeInput, ServoOutput};
use embedded_hal_async::delay::DelayNs;

use crate::block::Block;
use crate::chain::MachineState;
use crate::plugin::BltouchPlugin;
use crate::status::Status;

/// Options report request (`$I`)
pub const REPORT_OPTIONS: &str = "I";

impl<'a, S, P, D, L> BltouchPlugin<'a, S, P, D, L>
where
    S: ServoOutput,
    P: ProbeInput,
    D: DelayNs,
    L: LogSink,
{
    /// Handle one complete line and return the status to report
    pub async fn handle_line(&mut self, state: MachineState, line: &str) -> Status {
        let line = line.trim();
        if let Some(command) = line.strip_prefix('$') {
            return self.handle_system(command);
        }

        let block = match Block::parse(line) {
            Ok(block) => block,
            Err(status) => return status,
        };
        let Some(mcode) = block.mcode else {
            return if block.words.is_empty() {
                Status::Ok
            } else {
                Status::GcodeUnsupportedCommand
            };
        };

        if !self.check(mcode) {
            return Status::GcodeUnsupportedCommand;
        }
        match self.validate(&block) {
            Status::Ok => {}
            Status::Unhandled => return Status::GcodeUnsupportedCommand,
            status => return status,
        }
        if self.execute(state, &block).await {
            Status::Ok
        } else {
            Status::GcodeUnsupportedCommand
        }
    }

    fn handle_system(&mut self, command: &str) -> Status {
        if command.trim().eq_ignore_ascii_case(REPORT_OPTIONS) {
            self.report_options(false);
            return Status::Ok;
        }
        match self.system_command(command) {
            Status::Unhandled => Status::InvalidStatement,
            status => status,
        }
    }
}
