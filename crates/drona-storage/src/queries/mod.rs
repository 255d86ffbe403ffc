//! SQL for the `job_history` table. Functions take a borrowed connection and
//! never open or commit on their own.

pub mod job_history;
