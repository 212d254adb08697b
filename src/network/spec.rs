use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NeuralNetError, Result};
use crate::layers::{
    BatchNormLayer, Conv2DLayer, DenseLayer, DropoutLayer, InputLayer, Layer, MaxPoolLayer,
    SoftmaxLayer, SquaredErrorRegressionLayer, ActivationLayer,
};
use crate::loss::loss_type::LossType;
use crate::network::network::NeuralNet;
use crate::train::train_config::NeuralNetLearnerConfig;

fn default_stride() -> usize {
    1
}

fn default_batch_norm_momentum() -> f64 {
    0.9
}

/// Hyperparameters of one layer, tagged by `"type"` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerKind {
    Input { width: usize, height: usize, depth: usize },
    Dense { units: usize, activation: ActivationFunction },
    Conv2d {
        filter_width: usize,
        filter_height: usize,
        filter_count: usize,
        #[serde(default = "default_stride")]
        stride: usize,
        #[serde(default)]
        padding: usize,
        activation: ActivationFunction,
    },
    MaxPool {
        pool_width: usize,
        pool_height: usize,
        stride: usize,
        #[serde(default)]
        padding: usize,
    },
    Activation { function: ActivationFunction },
    Dropout { drop_probability: f64 },
    BatchNorm {
        #[serde(default = "default_batch_norm_momentum")]
        momentum: f64,
    },
    Softmax { classes: usize },
    Regression { targets: usize },
}

/// Describes one layer in a network specification.
///
/// `input_size`, when given, is checked against the number of units the
/// previous layer emits (or, for the input layer, the units it declares).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    #[serde(flatten)]
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_size: Option<usize>,
}

impl LayerSpec {
    pub fn new(kind: LayerKind) -> LayerSpec {
        LayerSpec { kind, input_size: None }
    }

    fn to_layer(&self) -> Layer {
        match &self.kind {
            LayerKind::Input { width, height, depth } => InputLayer::new(*width, *height, *depth).into(),
            LayerKind::Dense { units, activation } => DenseLayer::new(*units, *activation).into(),
            LayerKind::Conv2d { filter_width, filter_height, filter_count, stride, padding, activation } => {
                Conv2DLayer::new(*filter_width, *filter_height, *filter_count, *stride, *padding, *activation).into()
            }
            LayerKind::MaxPool { pool_width, pool_height, stride, padding } => {
                MaxPoolLayer::with_padding(*pool_width, *pool_height, *stride, *padding).into()
            }
            LayerKind::Activation { function } => ActivationLayer::new(*function).into(),
            LayerKind::Dropout { drop_probability } => DropoutLayer::new(*drop_probability).into(),
            LayerKind::BatchNorm { momentum } => BatchNormLayer::with_momentum(*momentum).into(),
            LayerKind::Softmax { classes } => SoftmaxLayer::new(*classes).into(),
            LayerKind::Regression { targets } => SquaredErrorRegressionLayer::new(*targets).into(),
        }
    }
}

/// A serializable description of a network architecture, its loss and its
/// training hyperparameters.
///
/// A spec can be saved and loaded independently of trained weights, so
/// architectures can be stored before training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    pub loss: LossType,
    #[serde(default)]
    pub learner: NeuralNetLearnerConfig,
}

impl NetworkSpec {
    /// Builds the (uninitialized) network, validating every shape and every
    /// declared `input_size`.
    pub fn build(&self) -> Result<NeuralNet> {
        let mut net = NeuralNet::new();
        // position of each spec layer in `net.layers`; `add` may insert
        // activation layers in between
        let mut positions = Vec::with_capacity(self.layers.len());
        for spec in &self.layers {
            positions.push(net.layers.len());
            net.add(spec.to_layer());
        }

        let shapes = net.output_shapes()?;
        let first_units = net.input_shape()?.units();
        for (spec, &index) in self.layers.iter().zip(&positions) {
            let Some(declared) = spec.input_size else { continue };
            let incoming = if index == 0 { first_units } else { shapes[index - 1].units() };
            if declared != incoming {
                return Err(NeuralNetError::ShapeMismatch {
                    index,
                    layer: net.layers[index].name(),
                    message: format!("declared input_size {declared}, previous layer emits {incoming} units"),
                });
            }
        }
        Ok(net)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
