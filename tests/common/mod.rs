use std::{
    fs,
    path::PathBuf,
    sync::{
        Once,
        atomic::{AtomicU32, Ordering},
    },
};

use chrono::NaiveDate;

static COUNTER: AtomicU32 = AtomicU32::new(0);
static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Writes report text to a unique temp file and returns its path.
pub fn write_report(text: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "cotwatch_it_{}_{}.txt",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    fs::write(&path, text).unwrap();
    path
}

/// Builds one market's block of a synthetic CFTC-style report: a header line
/// followed by one line per (date, long, short) row, every line carrying the
/// market title so keyword selection finds them.
pub fn market_block(title: &str, rows: &[(NaiveDate, i64, i64)]) -> String {
    let mut out = format!(
        "{title}  As of Date in Form YYYYMMDD  Long (Noncommercial)  Short (Noncommercial)\n"
    );
    for (date, long, short) in rows {
        out.push_str(&format!(
            "{title}  {}  {}  {}\n",
            date.format("%Y%m%d"),
            long,
            short
        ));
    }
    out
}

/// Weekly report rows starting 2024-01-02, one per (long, short) pair.
pub fn weekly_rows(longs: &[i64], shorts: &[i64]) -> Vec<(NaiveDate, i64, i64)> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    longs
        .iter()
        .zip(shorts)
        .enumerate()
        .map(|(i, (l, s))| (start + chrono::Days::new(7 * i as u64), *l, *s))
        .collect()
}
