use cronobat_core::{format_clock, parse_clock};

pub fn format(seconds: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", format_clock(seconds));
    Ok(())
}

pub fn parse(clock: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", parse_clock(clock)?);
    Ok(())
}
