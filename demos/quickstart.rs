//! Quickstart demo: run a defended simulation and watch the backdoor fail

use vanta_fl::math::{dot, magnitude};
use vanta_fl::{SimConfig, Simulation};

fn main() {
    println!("Vanta-FL Quickstart Demo\n");

    let config = SimConfig {
        attack_stealth: 0.3,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(&config, 42).expect("valid config");

    println!("Simulating 30 rounds (16 benign, 4 malicious clients)...\n");

    for _ in 0..30 {
        let state = sim.advance(&config).expect("advance");
        if state.round % 5 == 0 {
            let rejected = state.clients.iter().filter(|c| !c.accepted).count();
            println!(
                "round {:>2}  acc={:.3}  asr={:.3}  rejected={:>2}/20",
                state.round, state.global_accuracy, state.backdoor_success_rate, rejected
            );
        }
    }

    // Alignment of the surviving updates with the true direction.
    let state = sim.state();
    let reference = sim.true_direction();
    let mut alignments: Vec<f32> = state
        .clients
        .iter()
        .filter(|c| c.accepted)
        .map(|c| dot(&c.gradient, reference) / (magnitude(&c.gradient) * magnitude(reference)))
        .collect();
    alignments.sort_by(|a, b| a.partial_cmp(b).unwrap());

    println!("\nAccepted-update alignment with the true direction:");
    println!(
        "   min={:.3}  max={:.3}  (n={})",
        alignments.first().copied().unwrap_or(0.0),
        alignments.last().copied().unwrap_or(0.0),
        alignments.len()
    );
    println!("\nBackdoor filtered out; global accuracy recovered!");
}
