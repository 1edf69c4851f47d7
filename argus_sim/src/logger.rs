// argus_sim/src/logger.rs

//! File-based run log: a header block describing the scenario, then one
//! tab-aligned metrics row per observation step. Flushed per row so an
//! aborted run still leaves a readable log.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub struct RunLogger {
    writer: BufWriter<File>,
    step: usize,
}

impl RunLogger {
    pub fn create(path: &Path, header: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", header.trim_end())?;
        writeln!(
            writer,
            "{:<6} {:<10} {:<8} {:<8} {:<10}",
            "step", "entropy", "mse", "height", "coverage"
        )?;
        writeln!(writer, "{}", "-".repeat(48))?;
        Ok(Self { writer, step: 0 })
    }

    pub fn log_step(
        &mut self,
        entropy: f64,
        mse: f64,
        height: f64,
        coverage: f64,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "{:<6} {:<10.2} {:<8.4} {:<8.1} {:<10.4}",
            self.step, entropy, mse, height, coverage
        )?;
        self.writer.flush()?;
        self.step += 1;
        Ok(())
    }

    /// Free-form trailer line (e.g. the action history at the end of a run).
    pub fn note(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", text)?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn log_contains_header_and_rows() {
        let path = env::temp_dir().join("argus_logger_test.txt");
        {
            let mut logger = RunLogger::create(&path, "# strategy: ig").unwrap();
            logger.log_step(100.0, 0.25, 5.4, 0.1).unwrap();
            logger.log_step(90.0, 0.20, 5.4, 0.2).unwrap();
        }
        let contents = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();
        assert!(contents.starts_with("# strategy: ig"));
        assert!(contents.contains("entropy"));
        assert_eq!(contents.lines().count(), 5);
    }
}
