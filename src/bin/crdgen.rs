//! Prints the PodSet CRD manifest as YAML.
//!
//! ```bash
//! cargo run --bin crdgen > deploy/crd.yaml
//! ```

use kube::CustomResourceExt;

use podset_operator::crd::PodSet;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&PodSet::crd())?);
    Ok(())
}
