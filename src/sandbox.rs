//! Editing session: the canonical network plus everything derived from it.
//!
//! The sandbox is the caller the engine expects: it checks structural edits
//! against the configured limits before committing them, keeps drafts in
//! step with the network, holds numeric updates back while any field is
//! invalid, and replaces state wholesale on import, reset and reveal.

use crate::challenge::Challenge;
use crate::codec::{self, CodecError, Imported};
use crate::config::{Config, StructuralLimitError};
use crate::draft::{self, Drafts, ParameterAddress, UnknownAddress};
use crate::grid::{sample_network, Grid};
use crate::neural::{
    evaluate_full, Activation, InputValues, MutationError, Network, RevealAnimation, Trace,
};
use crate::score::{score, ScoreBand};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Why an edit was rejected; the sandbox keeps its previous state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    Mutation(MutationError),
    Limit(StructuralLimitError),
    UnknownAddress(ParameterAddress),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mutation(e) => write!(f, "{}", e),
            Self::Limit(e) => write!(f, "{}", e),
            Self::UnknownAddress(a) => write!(f, "no editable parameter at {}", a),
        }
    }
}

impl std::error::Error for EditError {}

impl From<MutationError> for EditError {
    fn from(e: MutationError) -> Self {
        Self::Mutation(e)
    }
}

impl From<StructuralLimitError> for EditError {
    fn from(e: StructuralLimitError) -> Self {
        Self::Limit(e)
    }
}

impl From<UnknownAddress> for EditError {
    fn from(e: UnknownAddress) -> Self {
        Self::UnknownAddress(e.0)
    }
}

/// What happened to a draft edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStatus {
    /// Every field parsed and the network was updated
    Applied,
    /// Some fields are invalid; numeric updates are paused
    Paused { invalid: usize },
}

/// Active challenge with its target sampled once
struct ActiveChallenge {
    challenge: &'static Challenge,
    target: Grid,
}

/// The editing session
pub struct Sandbox {
    config: Config,
    network: Network,
    inputs: InputValues,
    drafts: Drafts,
    invalid: BTreeSet<ParameterAddress>,
    challenge: Option<ActiveChallenge>,
    /// Solution an in-flight reveal is heading for
    reveal_target: Option<Network>,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl Sandbox {
    /// Start with the identity network at the origin; the configuration
    /// must pass [`Config::validate`]
    pub fn new(config: Config) -> Result<Self, String> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: Config) -> Self {
        let network = Network::identity();
        let inputs = [0.0; crate::neural::INPUT_WIDTH];
        let drafts = draft::build_drafts(&network, &inputs);

        Self {
            config,
            network,
            inputs,
            drafts,
            invalid: BTreeSet::new(),
            challenge: None,
            reveal_target: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Swap in a new configuration, resampling the challenge target if the
    /// grid resolution changed. An invalid configuration is rejected and the
    /// current one kept.
    pub fn set_config(&mut self, config: Config) -> Result<(), String> {
        config.validate()?;
        let resolution = config.grid.resolution;
        self.config = config;

        if let Some(active) = &mut self.challenge {
            if active.target.resolution != resolution {
                log::debug!("resampling target at resolution {}", resolution);
                active.target = active.challenge.target_grid(resolution);
            }
        }
        Ok(())
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn inputs(&self) -> &InputValues {
        &self.inputs
    }

    pub fn drafts(&self) -> &Drafts {
        &self.drafts
    }

    /// Addresses whose draft does not parse
    pub fn invalid_fields(&self) -> &BTreeSet<ParameterAddress> {
        &self.invalid
    }

    /// Numeric updates are held back until every draft is valid
    pub fn is_paused(&self) -> bool {
        !self.invalid.is_empty()
    }

    /// Replace the network and inputs, reconciling drafts against them
    fn install(&mut self, network: Network, inputs: InputValues) {
        self.drafts = draft::reconcile(&self.drafts, &network, &inputs);
        self.invalid.clear();
        self.network = network;
        self.inputs = inputs;
    }

    /// Commit a structural edit if it stays within the configured limits
    fn commit_structure(&mut self, candidate: Network, action: &str) -> Result<(), EditError> {
        if let Err(e) = self.config.limits.check(&candidate) {
            log::warn!("{} rejected: {}", action, e);
            return Err(e.into());
        }
        debug_assert!(candidate.check_invariants().is_ok());

        log::debug!(
            "{}: {} layers, {} weights",
            action,
            candidate.layer_count(),
            candidate.total_weights()
        );
        let inputs = self.inputs;
        self.install(candidate, inputs);
        Ok(())
    }

    pub fn add_hidden_layer(&mut self) -> Result<(), EditError> {
        let candidate = self.network.add_hidden_layer()?;
        self.commit_structure(candidate, "add layer")
    }

    pub fn add_neuron(&mut self, layer: usize) -> Result<(), EditError> {
        let candidate = self.network.add_neuron(layer)?;
        self.commit_structure(candidate, "add neuron")
    }

    pub fn remove_layer(&mut self, layer: usize) -> Result<(), EditError> {
        let candidate = self.network.remove_layer(layer)?;
        self.commit_structure(candidate, "remove layer")
    }

    pub fn remove_neuron(&mut self, layer: usize, neuron: usize) -> Result<(), EditError> {
        let candidate = self.network.remove_neuron(layer, neuron)?;
        self.commit_structure(candidate, "remove neuron")
    }

    pub fn set_activation(&mut self, layer: usize, activation: Activation) -> Result<(), EditError> {
        let candidate = self.network.set_activation(layer, activation)?;
        self.commit_structure(candidate, "set activation")
    }

    /// Write user text into one field
    pub fn edit(&mut self, address: ParameterAddress, text: &str) -> Result<EditStatus, EditError> {
        let outcome = draft::commit_edit(&self.drafts, address, text, &self.network, &self.inputs)?;

        let was_paused = self.is_paused();
        self.drafts = outcome.drafts;
        self.invalid = outcome.invalid;

        match outcome.applied {
            Some((network, inputs)) => {
                if was_paused {
                    log::info!("all fields valid again, updates resumed");
                }
                self.network = network;
                self.inputs = inputs;
                Ok(EditStatus::Applied)
            }
            None => {
                if !was_paused {
                    log::info!("field {} is invalid, updates paused", address);
                }
                Ok(EditStatus::Paused {
                    invalid: self.invalid.len(),
                })
            }
        }
    }

    /// Back to the identity network at the origin
    pub fn reset(&mut self) {
        log::info!("sandbox reset");
        self.install(Network::identity(), [0.0; crate::neural::INPUT_WIDTH]);
    }

    /// Replace state from import text; on failure nothing changes
    pub fn import_text(&mut self, text: &str) -> Result<(), CodecError> {
        let imported = codec::import_text(text, &self.config.limits)
            .inspect_err(|e| log::warn!("import rejected: {}", e))?;
        self.accept_import(imported);
        Ok(())
    }

    /// Replace state from an import file; on failure nothing changes
    pub fn import_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CodecError> {
        let imported = codec::import_file(path, &self.config.limits)
            .inspect_err(|e| log::warn!("import rejected: {}", e))?;
        self.accept_import(imported);
        Ok(())
    }

    fn accept_import(&mut self, imported: Imported) {
        log::info!("import accepted ({:?} layout)", imported.shape);
        self.install(imported.network, imported.inputs);
    }

    pub fn export_text(&self) -> Result<String, CodecError> {
        codec::export_text(&self.network, &self.inputs, &self.config.limits)
    }

    pub fn export_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CodecError> {
        codec::export_file(path, &self.network, &self.inputs, &self.config.limits)
    }

    /// Full forward trace at the current input point
    pub fn trace(&self) -> Trace {
        evaluate_full(&self.network, &self.inputs)
    }

    /// The network's heatmap at the configured resolution
    pub fn network_grid(&self) -> Grid {
        sample_network(&self.network, self.config.grid.resolution)
    }

    /// Make `challenge` the active target
    pub fn select_challenge(&mut self, challenge: &'static Challenge) {
        log::info!("challenge selected: {}", challenge.id);
        self.reveal_target = None;
        self.challenge = Some(ActiveChallenge {
            challenge,
            target: challenge.target_grid(self.config.grid.resolution),
        });
    }

    pub fn clear_challenge(&mut self) {
        self.challenge = None;
        self.reveal_target = None;
    }

    pub fn challenge(&self) -> Option<&'static Challenge> {
        self.challenge.as_ref().map(|a| a.challenge)
    }

    /// Target heatmap of the active challenge
    pub fn target_grid(&self) -> Option<&Grid> {
        self.challenge.as_ref().map(|a| &a.target)
    }

    /// Score of the current network against the active challenge
    pub fn score(&self) -> Option<f64> {
        let active = self.challenge.as_ref()?;
        Some(score(&self.network_grid(), &active.target))
    }

    pub fn score_band(&self) -> Option<ScoreBand> {
        self.score().map(ScoreBand::from_score)
    }

    /// Animation from the current network to the active challenge's solution
    pub fn reveal_solution(&mut self) -> Option<RevealAnimation> {
        let solution = self.challenge.as_ref()?.challenge.solution()?;
        let duration = Duration::from_millis(self.config.reveal.duration_ms);
        log::info!("revealing solution over {:?}", duration);
        let animation = RevealAnimation::new(&self.network, solution, duration);
        self.reveal_target = Some(animation.target().clone());
        Some(animation)
    }

    /// Install one animation frame, keeping the current inputs
    pub fn show_frame(&mut self, network: Network) {
        if self.reveal_target.as_ref() == Some(&network) {
            log::info!("reveal finished");
            self.reveal_target = None;
        }
        let inputs = self.inputs;
        self.install(network, inputs);
    }

    /// Whether a reveal has started and not yet landed on its target
    pub fn is_revealing(&self) -> bool {
        self.reveal_target.is_some()
    }
}
