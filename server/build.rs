use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    eventdesk_build::run()
}
