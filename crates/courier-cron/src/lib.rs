// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder trigger and the optional in-process cron runner.
//!
//! [`ReminderTrigger`] performs one bounded processing run. [`CronRunner`]
//! calls it on a cron schedule until cancelled; HTTP triggering through the
//! gateway does not need it.

pub mod runner;
pub mod trigger;

pub use runner::CronRunner;
pub use trigger::ReminderTrigger;
