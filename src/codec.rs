//! Versioned JSON import/export of a network and its input point.
//!
//! Import treats the payload as untrusted: it is size-checked before
//! parsing, normalized once into a [`PayloadShape`], then validated in full
//! before any [`Network`] is built. Nothing is returned on failure.

use crate::config::{LimitsConfig, StructuralLimitError};
use crate::neural::{Activation, InputValues, Layer, Network, Neuron, INPUT_WIDTH};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// Schema tag written into every export
pub const SCHEMA: &str = "nn-builder/network";
/// Current payload version
pub const VERSION: u64 = 1;

/// Exported document
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub schema: &'static str,
    pub version: u64,
    pub exported_at: String,
    pub network: NetworkDocument,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDocument {
    pub layers: Vec<LayerDocument>,
    pub input_values: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Input,
    Hidden,
    Output,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDocument {
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub activation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neuron_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neurons: Option<Vec<NeuronDocument>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NeuronDocument {
    pub bias: f64,
    pub weights: Vec<f64>,
}

/// A successfully validated import
#[derive(Clone, Debug, PartialEq)]
pub struct Imported {
    pub network: Network,
    pub inputs: InputValues,
    /// Which payload layout the network was read from
    pub shape: ShapeKind,
}

/// Accepted payload layouts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    /// `{schema, version, network: {...}}`
    Versioned,
    /// `{network: {...}}` without metadata
    Nested,
    /// `{layers, inputValues}` at the root
    Legacy,
}

/// Payload resolved to the object holding `layers` and `inputValues`
enum PayloadShape<'a> {
    Versioned(&'a Map<String, Value>),
    Nested(&'a Map<String, Value>),
    Legacy(&'a Map<String, Value>),
}

impl<'a> PayloadShape<'a> {
    fn network(&self) -> &'a Map<String, Value> {
        match self {
            Self::Versioned(n) | Self::Nested(n) | Self::Legacy(n) => n,
        }
    }

    fn kind(&self) -> ShapeKind {
        match self {
            Self::Versioned(_) => ShapeKind::Versioned,
            Self::Nested(_) => ShapeKind::Nested,
            Self::Legacy(_) => ShapeKind::Legacy,
        }
    }
}

/// Errors from import and export
#[derive(Debug)]
pub enum CodecError {
    Io(std::io::Error),
    Json(serde_json::Error),
    TooLarge { size: usize, max: usize },
    NotAnObject,
    IncompleteMetadata,
    SchemaMismatch { found: String },
    VersionMismatch { found: String },
    MissingNetwork,
    LayersNotArray,
    TooFewLayers { found: usize },
    Limit(StructuralLimitError),
    InputLayer { found: String },
    MalformedLayer { layer: usize },
    UnknownActivation { layer: usize, id: String },
    EmptyLayer { layer: usize },
    OutputWidth { found: usize },
    MalformedNeuron { layer: usize, neuron: usize },
    InvalidBias { layer: usize, neuron: usize },
    WeightCount { layer: usize, neuron: usize, expected: usize, found: usize },
    InvalidWeight { layer: usize, neuron: usize, weight: usize },
    InputValues(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Json(e) => write!(f, "Invalid JSON: {}", e),
            Self::TooLarge { size, max } => {
                write!(f, "File is too large: {} bytes (limit {} bytes)", size, max)
            }
            Self::NotAnObject => write!(f, "Payload must be an object describing a network"),
            Self::IncompleteMetadata => {
                write!(f, "Payload metadata is incomplete: schema and version must both be present")
            }
            Self::SchemaMismatch { found } => {
                write!(f, "Unsupported schema {} (expected \"{}\")", found, SCHEMA)
            }
            Self::VersionMismatch { found } => {
                write!(f, "Unsupported version {} (expected {})", found, VERSION)
            }
            Self::MissingNetwork => write!(f, "Payload has no network object"),
            Self::LayersNotArray => write!(f, "Network layers must be an array"),
            Self::TooFewLayers { found } => {
                write!(f, "Network needs at least 2 layers, found {}", found)
            }
            Self::Limit(e) => write!(f, "{}", e),
            Self::InputLayer { found } => write!(
                f,
                "Input layer must have exactly {} neurons, found {}",
                INPUT_WIDTH, found
            ),
            Self::MalformedLayer { layer } => write!(f, "Layer {} is malformed", layer),
            Self::UnknownActivation { layer, id } => {
                write!(f, "Layer {} has unknown activation '{}'", layer, id)
            }
            Self::EmptyLayer { layer } => write!(f, "Layer {} has no neurons", layer),
            Self::OutputWidth { found } => {
                write!(f, "Output layer must have exactly 1 neuron, found {}", found)
            }
            Self::MalformedNeuron { layer, neuron } => {
                write!(f, "Layer {} neuron {} is malformed", layer, neuron)
            }
            Self::InvalidBias { layer, neuron } => {
                write!(f, "Layer {} neuron {} has a non-finite bias", layer, neuron)
            }
            Self::WeightCount { layer, neuron, expected, found } => write!(
                f,
                "Layer {} neuron {} has {} weights, expected {}",
                layer, neuron, found, expected
            ),
            Self::InvalidWeight { layer, neuron, weight } => write!(
                f,
                "Layer {} neuron {} weight {} is not a finite number",
                layer, neuron, weight
            ),
            Self::InputValues(reason) => write!(f, "Invalid input values: {}", reason),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Limit(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<StructuralLimitError> for CodecError {
    fn from(e: StructuralLimitError) -> Self {
        Self::Limit(e)
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Build the export document, checked through the import path
pub fn export_payload(
    net: &Network,
    inputs: &InputValues,
    limits: &LimitsConfig,
    exported_at: DateTime<Utc>,
) -> Result<ExportPayload, CodecError> {
    let mut layers = Vec::with_capacity(net.layer_count());
    layers.push(LayerDocument {
        kind: LayerKind::Input,
        activation: Activation::Linear.id(),
        neuron_count: Some(net.input_width),
        neurons: None,
    });

    let output = net.output_index();
    for (i, layer) in net.layers.iter().enumerate() {
        let kind = if i + 1 == output {
            LayerKind::Output
        } else {
            LayerKind::Hidden
        };
        layers.push(LayerDocument {
            kind,
            activation: layer.activation.id(),
            neuron_count: None,
            neurons: Some(
                layer
                    .neurons
                    .iter()
                    .map(|n| NeuronDocument {
                        bias: n.bias,
                        weights: n.weights.clone(),
                    })
                    .collect(),
            ),
        });
    }

    let payload = ExportPayload {
        schema: SCHEMA,
        version: VERSION,
        exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        network: NetworkDocument {
            layers,
            input_values: inputs.to_vec(),
        },
    };

    import_value(&serde_json::to_value(&payload)?, limits)?;
    Ok(payload)
}

/// Pretty-printed export document stamped with the current time
pub fn export_text(
    net: &Network,
    inputs: &InputValues,
    limits: &LimitsConfig,
) -> Result<String, CodecError> {
    let payload = export_payload(net, inputs, limits, Utc::now())?;
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Write an export document to a file
pub fn export_file<P: AsRef<Path>>(
    path: P,
    net: &Network,
    inputs: &InputValues,
    limits: &LimitsConfig,
) -> Result<(), CodecError> {
    let text = export_text(net, inputs, limits)?;
    std::fs::write(path, text)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import from raw text, enforcing the byte ceiling before parsing
pub fn import_text(text: &str, limits: &LimitsConfig) -> Result<Imported, CodecError> {
    if text.len() > limits.max_import_bytes {
        return Err(CodecError::TooLarge {
            size: text.len(),
            max: limits.max_import_bytes,
        });
    }
    let value: Value = serde_json::from_str(text)?;
    import_value(&value, limits)
}

/// Import from a file, checking its size before reading it
pub fn import_file<P: AsRef<Path>>(path: P, limits: &LimitsConfig) -> Result<Imported, CodecError> {
    let size = std::fs::metadata(&path)?.len();
    if size > limits.max_import_bytes as u64 {
        return Err(CodecError::TooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            max: limits.max_import_bytes,
        });
    }
    let text = std::fs::read_to_string(path)?;
    import_text(&text, limits)
}

/// Validate an already parsed payload and build the network it describes
pub fn import_value(value: &Value, limits: &LimitsConfig) -> Result<Imported, CodecError> {
    let shape = normalize(value)?;
    let network = shape.network();

    let net = read_layers(network.get("layers"), limits)?;
    let inputs = read_inputs(network.get("inputValues"))?;
    log::debug!(
        "Imported {:?} payload: {} layers, {} weights",
        shape.kind(),
        net.layer_count(),
        net.total_weights()
    );

    Ok(Imported {
        network: net,
        inputs,
        shape: shape.kind(),
    })
}

/// Resolve the object holding the network, checking metadata on the way
fn normalize(value: &Value) -> Result<PayloadShape<'_>, CodecError> {
    let root = value.as_object().ok_or(CodecError::NotAnObject)?;

    let schema = root.get("schema");
    let version = root.get("version");
    match (schema, version) {
        (None, None) => {}
        (Some(schema), Some(version)) => {
            if schema.as_str() != Some(SCHEMA) {
                return Err(CodecError::SchemaMismatch {
                    found: schema.to_string(),
                });
            }
            if version.as_u64() != Some(VERSION) {
                return Err(CodecError::VersionMismatch {
                    found: version.to_string(),
                });
            }
            return root
                .get("network")
                .and_then(Value::as_object)
                .map(PayloadShape::Versioned)
                .ok_or(CodecError::MissingNetwork);
        }
        _ => return Err(CodecError::IncompleteMetadata),
    }

    if let Some(nested) = root.get("network").and_then(Value::as_object) {
        return Ok(PayloadShape::Nested(nested));
    }
    if root.contains_key("layers") {
        return Ok(PayloadShape::Legacy(root));
    }
    Err(CodecError::NotAnObject)
}

fn read_layers(layers: Option<&Value>, limits: &LimitsConfig) -> Result<Network, CodecError> {
    let layers = layers
        .and_then(Value::as_array)
        .ok_or(CodecError::LayersNotArray)?;

    if layers.len() < 2 {
        return Err(CodecError::TooFewLayers {
            found: layers.len(),
        });
    }
    if layers.len() > limits.max_layers {
        return Err(StructuralLimitError::TooManyLayers {
            found: layers.len(),
            max: limits.max_layers,
        }
        .into());
    }

    let neuron_count = layers[0]
        .as_object()
        .ok_or(CodecError::MalformedLayer { layer: 0 })?
        .get("neuronCount");
    if neuron_count.and_then(Value::as_f64) != Some(INPUT_WIDTH as f64) {
        return Err(CodecError::InputLayer {
            found: neuron_count.map_or_else(|| "none".to_string(), Value::to_string),
        });
    }

    let last = layers.len() - 1;
    let mut prev_width = INPUT_WIDTH;
    let mut total_weights = 0usize;
    let mut built = Vec::with_capacity(last);

    for (index, layer) in layers.iter().enumerate().skip(1) {
        let layer = layer
            .as_object()
            .ok_or(CodecError::MalformedLayer { layer: index })?;

        let id = layer.get("activation").and_then(Value::as_str).unwrap_or("");
        let activation =
            Activation::from_id(id).ok_or_else(|| CodecError::UnknownActivation {
                layer: index,
                id: id.to_string(),
            })?;

        let neurons = layer
            .get("neurons")
            .and_then(Value::as_array)
            .ok_or(CodecError::MalformedLayer { layer: index })?;
        if neurons.is_empty() {
            return Err(CodecError::EmptyLayer { layer: index });
        }
        if neurons.len() > limits.max_neurons_per_layer {
            return Err(StructuralLimitError::TooManyNeurons {
                layer: index,
                found: neurons.len(),
                max: limits.max_neurons_per_layer,
            }
            .into());
        }
        if index == last && neurons.len() != 1 {
            return Err(CodecError::OutputWidth {
                found: neurons.len(),
            });
        }

        let mut parsed = Vec::with_capacity(neurons.len());
        for (n, neuron) in neurons.iter().enumerate() {
            let neuron = read_neuron(neuron, index, n, prev_width)?;
            total_weights += neuron.weights.len();
            if total_weights > limits.max_total_weights {
                return Err(StructuralLimitError::TooManyWeights {
                    found: total_weights,
                    max: limits.max_total_weights,
                }
                .into());
            }
            parsed.push(neuron);
        }

        prev_width = parsed.len();
        built.push(Layer {
            activation,
            neurons: parsed,
        });
    }

    Ok(Network {
        input_width: INPUT_WIDTH,
        layers: built,
    })
}

fn read_neuron(
    value: &Value,
    layer: usize,
    neuron: usize,
    expected: usize,
) -> Result<Neuron, CodecError> {
    let object = value
        .as_object()
        .ok_or(CodecError::MalformedNeuron { layer, neuron })?;

    let bias = object
        .get("bias")
        .and_then(Value::as_f64)
        .filter(|b| b.is_finite())
        .ok_or(CodecError::InvalidBias { layer, neuron })?;

    let weights = object
        .get("weights")
        .and_then(Value::as_array)
        .ok_or(CodecError::MalformedNeuron { layer, neuron })?;
    if weights.len() != expected {
        return Err(CodecError::WeightCount {
            layer,
            neuron,
            expected,
            found: weights.len(),
        });
    }

    let weights = weights
        .iter()
        .enumerate()
        .map(|(weight, w)| {
            w.as_f64()
                .filter(|w| w.is_finite())
                .ok_or(CodecError::InvalidWeight { layer, neuron, weight })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Neuron { bias, weights })
}

fn read_inputs(value: Option<&Value>) -> Result<InputValues, CodecError> {
    let values = value
        .and_then(Value::as_array)
        .ok_or_else(|| CodecError::InputValues("must be an array".to_string()))?;

    if values.len() != INPUT_WIDTH {
        return Err(CodecError::InputValues(format!(
            "expected {} values, found {}",
            INPUT_WIDTH,
            values.len()
        )));
    }

    let mut inputs = [0.0; INPUT_WIDTH];
    for (slot, v) in values.iter().enumerate() {
        inputs[slot] = v
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CodecError::InputValues(format!("value {} is not a finite number", slot)))?;
    }
    Ok(inputs)
}
