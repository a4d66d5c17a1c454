use super::{bounded, network_of, resolve, Operator};
use crate::{
    constants::*,
    context::Context,
    individual::Individual,
    network::{Marker, Param, Stash},
};
use serde::{Deserialize, Serialize};

/// Perturbs synapse strengths with momentum.
///
/// The perturbation keeps the direction of the previous change (read from the stashed
/// previous strength) unless the direction toggle fires. A separate draw can flip a synapse
/// between excitatory and inhibitory. Without dynamic sign changes a perturbation that would
/// cross zero is halved until it doesn't; a synapse for which that never happens is left as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeSynapseStrength {
    pub change_probability: f64,
    pub direction_toggle_probability: f64,
    pub sign_change_probability: f64,
    pub min_strength: f64,
    pub max_strength: f64,
    pub deviation: f64,
    pub use_gauss: bool,
    pub allow_dynamic_sign_changes: bool,
    pub reinit_probability: f64,
}

impl Default for ChangeSynapseStrength {
    fn default() -> Self {
        Self {
            change_probability: NC_STRENGTH_CHANGE_PROB,
            direction_toggle_probability: NC_STRENGTH_DIRECTION_TOGGLE_PROB,
            sign_change_probability: NC_STRENGTH_SIGN_CHANGE_PROB,
            min_strength: NC_STRENGTH_MIN,
            max_strength: NC_STRENGTH_MAX,
            deviation: NC_STRENGTH_DEVIATION,
            use_gauss: NC_STRENGTH_USE_GAUSS,
            allow_dynamic_sign_changes: NC_STRENGTH_ALLOW_DYNAMIC_SIGN_CHANGES,
            reinit_probability: NC_STRENGTH_REINIT_PROB,
        }
    }
}

/// `strength + change`, mirrored across zero when `flip` asks for a sign change that the
/// change alone doesn't produce. With `sign_locked` the change is halved until the result lies
/// strictly on the intended side of zero.
fn shifted(strength: f64, mut change: f64, flip: bool, sign_locked: bool) -> Option<f64> {
    let excitatory = (strength >= 0.) != flip;
    for _ in 0..NC_STRENGTH_SIGN_LOCK_ATTEMPTS {
        let mut next = strength + change;
        if flip && (next >= 0.) == (strength >= 0.) {
            next = -next;
        }
        let on_side = if excitatory { next > 0. } else { next < 0. };
        if !sign_locked || on_side {
            return Some(next);
        }
        change /= 2.;
    }
    None
}

impl Operator for ChangeSynapseStrength {
    fn name(&self) -> &'static str {
        "ChangeSynapseStrength"
    }

    fn apply(&self, individual: &mut Individual, ctx: &mut Context) -> bool {
        let Some(net) = network_of(&mut individual.genome, self.name(), individual.id) else {
            return false;
        };

        let candidates: Vec<_> = net
            .synapses()
            .into_iter()
            .filter(|s| {
                net.synapse(*s).is_some_and(|s| {
                    !s.tags
                        .has_any(&[Marker::Protected, Marker::ProtectStrength])
                })
            })
            .collect();

        for id in candidates {
            let Some(s) = net.synapse(id) else {
                continue;
            };
            let probability = resolve(
                &s.tags,
                Param::ChangeProbability,
                self.change_probability,
                &net.tags,
            );
            if !ctx.rng.happens(probability) {
                continue;
            }
            let deviation = resolve(&s.tags, Param::ChangeDeviation, self.deviation, &net.tags);
            let min = resolve(&s.tags, Param::MinStrength, self.min_strength, &net.tags);
            let max = resolve(&s.tags, Param::MaxStrength, self.max_strength, &net.tags);
            let strength = s.strength;
            let previous = s.tags.stashed(Stash::PreviousStrength).unwrap_or(strength);

            if ctx.rng.happens(self.reinit_probability) {
                if let Some(s) = net.synapse_mut(id) {
                    s.strength = 0.;
                    s.tags.mark(Marker::Modified);
                }
                continue;
            }

            let mut change = if self.use_gauss {
                ctx.rng.gaussian(deviation)
            } else {
                ctx.rng.uniform(deviation)
            }
            .abs();
            let mut momentum = strength - previous;
            if momentum == 0. {
                momentum = ctx.rng.next_sign();
            }
            if momentum < 0. {
                change = -change;
            }
            if ctx.rng.happens(self.direction_toggle_probability) {
                change = -change;
            }
            let flip = ctx.rng.happens(self.sign_change_probability);

            let Some(next) = shifted(strength, change, flip, !self.allow_dynamic_sign_changes)
            else {
                tracing::debug!(synapse = %id, strength, "no sign preserving change found");
                continue;
            };
            if let Some(s) = net.synapse_mut(id) {
                s.strength = bounded(next, min, max);
                s.tags.stash(Stash::PreviousStrength, strength);
                s.tags.mark(Marker::Modified);
            }
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        assert_f64_approx, new_t,
        network::{test::layered, Network, Neuron, Synapse, SynapseTarget},
    };

    fn star(ctx: &mut Context, strengths: &[f64]) -> Network {
        let mut net = Network::new();
        let hub = ctx.ids.next();
        assert!(net.add_neuron(Neuron::new(hub, "hub")));
        for w in strengths {
            let n = ctx.ids.next();
            assert!(net.add_neuron(Neuron::new(n, "")));
            assert!(net.add_synapse(Synapse::new(
                ctx.ids.next(),
                n,
                SynapseTarget::Neuron(hub),
                *w
            )));
        }
        net
    }

    #[test]
    fn test_shifted() {
        assert_eq!(shifted(1., 0.5, false, true), Some(1.5));
        assert_eq!(shifted(1., -4., false, true), Some(0.5));
        assert_eq!(shifted(1., -4., false, false), Some(-3.));
        assert_eq!(shifted(1., 0.5, true, true), Some(-1.5));
        assert_eq!(shifted(-1., 3., true, true), Some(2.));
        assert_eq!(shifted(0., -1., false, true), None);
    }

    #[test]
    fn test_sign_locked_strengths() {
        let mut ctx = Context::seeded(17);
        let strengths = [0.5, -0.5, 3., -3., 0.01, -0.01];
        let net = star(&mut ctx, &strengths);
        let mut ind = Individual::with_network(1, net);
        let op = new_t!(
            ChangeSynapseStrength,
            change_probability = 1.,
            sign_change_probability = 0.,
            allow_dynamic_sign_changes = false,
            deviation = 2.,
            min_strength = -4.,
            max_strength = 4.,
        );

        let before: Vec<_> = {
            let net = ind.network().unwrap();
            net.synapses()
                .into_iter()
                .map(|s| (s, net.synapse(s).unwrap().strength))
                .collect()
        };
        for _ in 0..200 {
            assert!(op.apply(&mut ind, &mut ctx));
            let net = ind.network().unwrap();
            for (id, initial) in &before {
                let s = net.synapse(*id).unwrap().strength;
                assert!((-4. ..=4.).contains(&s), "{s}");
                assert_eq!(s > 0., *initial > 0., "{initial} became {s}");
            }
        }
    }

    #[test]
    fn test_stash_and_momentum() {
        let mut ctx = Context::seeded(2);
        let mut ind = Individual::with_network(1, star(&mut ctx, &[1.]));
        let op = new_t!(
            ChangeSynapseStrength,
            change_probability = 1.,
            direction_toggle_probability = 0.,
            sign_change_probability = 0.,
            max_strength = 100.,
            min_strength = -100.,
        );

        op.apply(&mut ind, &mut ctx);
        let net = ind.network().unwrap();
        let id = net.synapses()[0];
        let first = net.synapse(id).unwrap().strength;
        assert_eq!(
            net.synapse(id).unwrap().tags.stashed(Stash::PreviousStrength),
            Some(1.)
        );

        // the second change continues in the direction of the first
        op.apply(&mut ind, &mut ctx);
        let second = ind.network().unwrap().synapse(id).unwrap().strength;
        assert!((first - 1.) * (second - first) >= 0.);
    }

    #[test]
    fn test_protected_and_reinit() {
        let mut ctx = Context::seeded(2);
        let mut net = layered(&mut ctx.ids, 2, 1);
        let synapses = net.synapses();
        let (a, b) = (synapses[0], synapses[1]);
        net.synapse_mut(a)
            .unwrap()
            .tags
            .mark(Marker::ProtectStrength);
        let mut ind = Individual::with_network(1, net);

        let op = new_t!(
            ChangeSynapseStrength,
            change_probability = 1.,
            reinit_probability = 1.,
        );
        op.apply(&mut ind, &mut ctx);
        let net = ind.network().unwrap();
        assert_f64_approx!(net.synapse(a).unwrap().strength, 0.5);
        assert_f64_approx!(net.synapse(b).unwrap().strength, 0.);
    }
}
