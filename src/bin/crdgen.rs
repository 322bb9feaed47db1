//! Prints the CRD manifests for both API groups, ready for `kubectl apply`.

use kube::CustomResourceExt;
use meridian_installer::crd::{current, legacy};

fn main() {
    let crds = vec![
        // Legacy group, so test environments can be seeded with old-schema
        // objects.
        legacy::MeridianConfiguration::crd(),
        legacy::User::crd(),
        legacy::Project::crd(),
        legacy::Cluster::crd(),
        legacy::Seed::crd(),
        legacy::Preset::crd(),
        legacy::UserSSHKey::crd(),
        legacy::Addon::crd(),
        // Current group.
        current::MeridianConfiguration::crd(),
        current::User::crd(),
        current::Project::crd(),
        current::Cluster::crd(),
        current::Seed::crd(),
        current::Preset::crd(),
        current::UserSSHKey::crd(),
        current::Addon::crd(),
    ];

    for crd in crds {
        print!("---\n{}", serde_yaml::to_string(&crd).unwrap());
    }
}
