//! Demonstrates branching one base region into systematic variants.
//!
//! Run with: `cargo run --example branching -p hep-region`

use hep_region::{Region, SelectionTightened, VariableNegated, WeightScaled};

fn main() -> hep_region::Result<()> {
    let weight = "mc_weight * pileup_weight";
    let selection = "n_jets >= 2 && is_iso";
    let signal = Region::new("signal", weight, selection, "Signal region");
    let signal = signal.with_blinded(true);

    let sf_up = signal.varied(WeightScaled::new("lepton_sf_up"));
    let sf_down = signal.varied(WeightScaled::new("lepton_sf_down"));
    let met_cut = signal.varied(SelectionTightened::new("met > 50"));
    let anti_iso = signal.varied(VariableNegated::new("is_iso"));
    let anti_iso_met_cut = anti_iso.varied(SelectionTightened::new("met > 50"));

    let branches = [
        ("nominal", &signal),
        ("lepton_sf_up", &sf_up),
        ("lepton_sf_down", &sf_down),
        ("met_cut", &met_cut),
        ("anti_iso_met_cut", &anti_iso_met_cut),
    ];

    println!(
        "Base region '{}' (blinded: {})",
        signal.name(),
        signal.blinded()
    );
    for (name, region) in branches {
        let key = region.key();
        let depth = region.variations().len();
        let expression = region.weighted_selection()?;
        println!("  {name:18} {key}  {depth:>2} variations  {expression}");
    }

    // The base region was never touched
    assert!(signal.variations().is_empty());
    Ok(())
}
