use chrono::Utc;
use tracking::{GroundStation, OrbitalElements, Pointing, Propagator, Sgp4Propagator};

fn main() {
    let elements = OrbitalElements::new(
        "ISS (ZARYA)",
        "1 25544U 98067A   25235.75642456  .00011222  00000+0  20339-3 0  9993",
        "2 25544  51.6355 332.1708 0003307 260.2831  99.7785 15.50129787525648",
    );

    let lucknow = GroundStation::new(26.8467, 80.9462, 120.0);

    let propagator = Sgp4Propagator::new(lucknow);

    let observation = propagator.observe(&elements, Utc::now()).unwrap();

    println!("{:?}", observation);

    match Pointing::gate(&observation) {
        Pointing::Visible(angle) => println!(
            "Visible: Az={:.2}°, El={:.2}°",
            angle.azimuth(),
            angle.elevation()
        ),
        Pointing::BelowHorizon { elevation, .. } => {
            println!("Below horizon (El={:.2}°)", elevation)
        }
    }
}
