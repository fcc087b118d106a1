//! `flock doctor` — check the database and configuration.


use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::db::Store;
use crate::output::{OutputMode, render};

#[derive(Debug, Serialize)]
struct DoctorReport {
    ok: bool,
    server: String,
    db_path: String,
    statuses: u64,
    integrity: String,
}

pub fn run_doctor(mode: OutputMode, config: &Config) -> Result<()> {
    let db_path = config.db_path();
    let store = Store::open(&db_path)?;
    let integrity = store.integrity_check()?;

    let report = DoctorReport {
        ok: integrity == "ok",
        server: config.server.base_url.clone(),
        db_path: db_path.display().to_string(),
        statuses: store.count()?,
        integrity,
    };
    render(mode, &report, |r, w| {
        writeln!(w, "server:     {}", r.server)?;
        writeln!(w, "database:   {}", r.db_path)?;
        writeln!(w, "statuses:   {}", r.statuses)?;
        writeln!(w, "integrity:  {}", r.integrity)?;
        Ok(())
    })?;

    if report.ok {
        Ok(())
    } else {
        anyhow::bail!("integrity check failed: {}", report.integrity)
    }
}
