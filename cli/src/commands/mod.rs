mod helpers;
mod meal;
mod summary;
mod weight;

use std::time::Duration;

use anyhow::Result;
use tokio::io::{self, BufReader};
use tokio::sync::mpsc;

use macrolog_core::rollover::{RolloverMonitor, SystemClock};
use macrolog_core::Ledger;

pub(crate) use helpers::{
    describe_entries, format_targets, format_totals_line, is_yes, write_day,
};
pub(crate) use meal::{cmd_add, cmd_delete, delete_entries};
pub(crate) use summary::{cmd_reset, cmd_summary};
pub(crate) use weight::cmd_weight;

pub(crate) async fn cmd_session(ledger: Ledger, check_interval: u64) -> Result<()> {
    let interval = Duration::from_secs(check_interval.max(1));
    let (tx, rx) = mpsc::channel(4);
    let monitor = RolloverMonitor::starting_at(SystemClock, ledger.current_date());
    let handle = monitor.spawn(interval, tx);

    let stdin = BufReader::new(io::stdin());
    let result = crate::session::run(ledger, stdin, &mut std::io::stdout(), rx).await;

    handle.abort();
    result
}
