//! Scan the expander's I2C bus and dump the first bytes of every device.
//!
//! Run with:
//!   cargo run --example bus-scan -- http://127.0.0.1:8000 hci0 FA:6F:EC:EE:4B:36

use gattbus::expander::Expander;
use gattbus::gateway::HttpGateway;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "http://127.0.0.1:8000".to_string());
    let adapter = args.next().unwrap_or_else(|| "hci0".to_string());
    let peripheral = args.next().ok_or("usage: bus-scan <url> <adapter> <peripheral>")?;

    let bus = Expander::new(HttpGateway::new(url), adapter, peripheral);
    let session = bus.session();

    let devices = session.scan_i2c()?;
    eprintln!("{} device(s) on the bus", devices.len());

    for address in devices {
        match session.read(address, 4) {
            Ok(data) => println!("0x{address:02x}: {data:02x?}"),
            Err(e) => println!("0x{address:02x}: read failed: {e}"),
        }
    }

    session.release()?;
    Ok(())
}
