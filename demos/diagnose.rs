//! Lists every HID device and says whether it would be accepted.

use ps4pad::backends::HidApiBackend;
use ps4pad::{DeviceBackend, DeviceKind, ReportStream};

fn main() -> ps4pad::Result<()> {
    let backend = HidApiBackend::new()?;
    for device in backend.enumerate()? {
        if device.kind != DeviceKind::Hid {
            println!("{:?} {}", device.kind, device.handle);
            continue;
        }
        match backend.open(&device) {
            Ok((stream, caps)) => {
                let product = backend.product_string(&stream);
                let accepted = matches!(&product, Ok(p) if p == "Wireless Controller")
                    && caps.input_report_len == 64;
                println!(
                    "{} up=0x{:02x} u=0x{:02x} in={}B prod={:?} accepted={}",
                    device.handle,
                    caps.usage_page,
                    caps.usage,
                    caps.input_report_len,
                    product.ok(),
                    accepted
                );
                stream.close();
            }
            Err(e) => println!("{} open failed: {e}", device.handle),
        }
    }
    Ok(())
}
