use tenchain::matrix_product::operators::{cnot, hadamard};
use tenchain::trg::*;
use tenchain::*;

use flexi_logger::Logger;
use log::info;

const GHZ_QUBITS: usize = 5;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let _logger = Logger::try_with_str("info")?.start()?;

    let beta = ising_critical_beta() - 0.05;
    let exact = ising_log_partition_exact(beta);
    let computed = log_partition_per_site(ising_tensor(beta)?, TrgConfig::default())?;
    info!(
        "Ising at beta = {:.6}: TRG {:.10}, Onsager {:.10}, relative error {:.3e}",
        beta,
        computed,
        exact,
        ((computed - exact) / exact).abs()
    );

    let mut gates = vec![Gate::single(0, hadamard::<f64>())];
    gates.extend((0..GHZ_QUBITS - 1).map(|i| Gate::pair(i, cnot())));
    let ghz = circuit_to_mps(
        &[2; GHZ_QUBITS],
        &gates,
        &Truncation::none().with_cutoff(1e-12),
        SvDistribution::Right,
    )?;
    info!(
        "GHZ state on {} qubits: bond dimensions {:?}, entropy at the middle cut {:.6}",
        GHZ_QUBITS,
        ghz.bond_dims(),
        ghz.entanglement_entropy(GHZ_QUBITS / 2 - 1)?
    );
    for (i, amplitude) in ghz.to_vector()?.iter().enumerate() {
        if amplitude.abs() > 1e-12 {
            info!("  |{:0width$b}> {:+.6}", i, amplitude, width = GHZ_QUBITS);
        }
    }
    Ok(())
}
