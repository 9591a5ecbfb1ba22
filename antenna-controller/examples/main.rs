use antenna_controller::{PortSettings, RotatorCommand, RotatorLink, serial::SerialConnector};
use std::io::{BufRead, BufReader};
use std::thread;
use std::time::Duration;

/*
 * Before running this example, use the command in the terminal:
 *
 * socat -d -d pty,raw,echo=0 pty,raw,echo=0
 *
 * to create two virtual ports that simulate the link between this program and the rotator.
 */

fn main() {
    let sender_port = "/dev/pts/2".to_string();
    let receiver_port = "/dev/pts/3".to_string();

    // Rotator side: just echo whatever command arrives.
    let receiver = thread::spawn(move || {
        let port = serialport::new(&receiver_port, 9600)
            .timeout(Duration::from_secs(5))
            .open()
            .expect("Failed to open serial port (receiver)");

        let mut reader = BufReader::new(port);
        let mut line = String::new();

        match reader.read_line(&mut line) {
            Ok(n) if n > 0 => println!("Rotator: received {}", line.trim_end()),
            Ok(_) => println!("Rotator: no data received"),
            Err(e) => println!("Rotator: failed to read line: {}", e),
        }
    });

    let link = RotatorLink::new(SerialConnector);
    link.open(&PortSettings::new(sender_port))
        .expect("Failed to open serial port (sender)");

    let command = RotatorCommand::new(118.4, 32.7);
    link.send(&command).expect("Failed to send command");
    println!("Sent: {}", command);

    receiver.join().unwrap();
    link.close();
}
