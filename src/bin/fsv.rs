//! Fsv is a main binary executable for processing

use fix_setvar::FsvResult;

/// Main entry for fsv binary
pub fn main() -> FsvResult<()> {
    // Command line parse
    #[cfg(feature = "basic")]
    {
        use fix_setvar::FsvCli;
        let mut cli = FsvCli::new();
        if let Err(err) = cli.parse() {
            cli.print_error(&err.to_string());
            std::process::exit(1);
        }
    }

    // End
    Ok(())
}
