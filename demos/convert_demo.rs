use std::env;
use std::error::Error;

use irgen_rs::model::{to_regvue_json, to_xml, SchemaVersion};
use irgen_rs::sheet::{convert, Sheet, SheetNames, Workbook};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let workbook = Workbook::new(vec![
        Sheet::from_rows(
            "version",
            [
                ["TAG", "VALUE"],
                ["VENDOR", "example.org"],
                ["LIBRARY", "demo"],
                ["NAME", "gpio_ip"],
                ["VERSION", "1.0"],
            ],
        ),
        Sheet::from_rows(
            "address_map",
            [
                ["BLOCK", "OFFSET", "RANGE", "DESCRIPTION"],
                ["gpio", "0x50000000", "0x100", "general purpose I/O"],
            ],
        ),
        Sheet::from_rows(
            "gpio",
            [
                ["ADDR", "REG", "FIELD", "BIT", "WIDTH", "ATTRIBUTE", "DEFAULT", "DESCRIPTION"],
                ["0x00", "DIR", "PINS", "[15:0]", "16", "RW", "0x0", "1 = output"],
                ["", "", "rsvd", "[31:16]", "16", "RO", "", ""],
                ["0x10", "IRQ{n} n=0~1", "", "", "", "", "", "interrupt bank"],
                ["", "", "PENDING", "[15:0]", "16", "W1C", "0x0", ""],
                ["", "", "MASK", "[31:16]", "16", "RW", "0xFFFF", ""],
            ],
        ),
    ]);

    let component = convert(&workbook, &SheetNames::default())?;
    let bytes = if env::args().any(|arg| arg == "--regvue") {
        to_regvue_json(&component)?
    } else {
        to_xml(&component, SchemaVersion::Ieee1685_2014)?
    };
    print!("{}", String::from_utf8(bytes)?);
    Ok(())
}
