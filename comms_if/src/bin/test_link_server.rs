//! Simple telemetry link server test
//!
//! Binds a PAIR socket and plays the part of the robot: a line drifting slowly from side to side
//! under a five sensor array is published, and any motor demands received are printed.

use comms_if::{
    eqpt::{LinkMsg, SensorFrame},
    net::{MonitoredSocket, SocketOptions}
};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "test_link_server")]
struct Opt {
    /// Port to bind the link socket on
    #[structopt(short, long, default_value = "50002")]
    port: u16,

    /// Number of sensors in the simulated array
    #[structopt(short, long, default_value = "5")]
    num_sensors: usize,

    /// Period between sensor frames in milliseconds
    #[structopt(long, default_value = "50")]
    period_ms: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    // Create the context for zmq
    let ctx = zmq::Context::new();

    // Set the socket options
    let socket_options = SocketOptions {
        bind: true,
        block_on_first_connect: false,
        recv_timeout: 0,
        send_timeout: 10,
        linger: 1,
        ..Default::default()
    };

    // Create the socket
    let socket = MonitoredSocket::new(
        &ctx,
        zmq::PAIR,
        socket_options,
        &format!("tcp://*:{}", opt.port)
    )?;

    println!("Link server running on port {}", opt.port);

    let mut t = 0f64;

    loop {
        std::thread::sleep(std::time::Duration::from_millis(opt.period_ms));
        t += opt.period_ms as f64 * 1e-3;

        if !socket.connected() {
            continue;
        }

        // Line centre sweeps across the array, sensors near it read dark
        let centre = (opt.num_sensors as f64 - 1.0) * 0.5 * (1.0 + (0.5 * t).sin());
        let values = (0..opt.num_sensors)
            .map(|i| ((i as f64 - centre).abs() * 0.6).min(1.0))
            .collect();

        let msg = LinkMsg::Sensors(SensorFrame { values }).to_wire()?;
        if let Err(e) = socket.send(msg.as_str(), 0) {
            println!("Could not send sensor frame: {}", e);
        }

        // Drain any demands the client has sent
        while let Ok(Ok(s)) = socket.recv_string(zmq::DONTWAIT) {
            match LinkMsg::from_wire(&s) {
                Ok(LinkMsg::Motor(d)) => println!("Motor demands: {:.3} {:.3}", d.left, d.right),
                Ok(other) => println!("Unexpected message: {:?}", other),
                Err(e) => println!("Could not parse message: {}", e),
            }
        }
    }
}
