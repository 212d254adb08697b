use log::debug;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{NeuralNetError, Result};
use crate::layers::{ActivationLayer, Layer, LayerShape, ParametersAndGradients};
use crate::math::matrix::Matrix;

/// An ordered stack of layers forming one linear pipeline.
///
/// Layers are added with hyperparameters only; `initialize` binds shapes,
/// weights and batch buffers. The first layer must be an `InputLayer`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeuralNet {
    pub layers: Vec<Layer>,
    batch_size: usize,
    // output shape of every layer, bound at initialize
    shapes: Vec<LayerShape>,
}

impl NeuralNet {
    pub fn new() -> NeuralNet {
        NeuralNet::default()
    }

    /// Appends a layer, followed by an activation layer when the layer
    /// carries a non-identity activation.
    pub fn add(&mut self, layer: impl Into<Layer>) -> &mut Self {
        let layer = layer.into();
        let activation = layer.activation();
        self.layers.push(layer);
        if let Some(function) = activation {
            self.layers.push(Layer::Activation(ActivationLayer::new(function)));
        }
        self
    }

    /// Shape of one observation, declared by the leading input layer.
    pub fn input_shape(&self) -> Result<LayerShape> {
        match self.layers.first() {
            Some(Layer::Input(input)) => Ok(input.shape),
            Some(other) => Err(NeuralNetError::ShapeMismatch {
                index: 0,
                layer: other.name(),
                message: "the first layer must be an input layer".to_string(),
            }),
            None => Err(NeuralNetError::InvalidConfiguration("network has no layers".to_string())),
        }
    }

    /// Propagates shapes through the stack without allocating anything.
    /// Fails on the first layer that cannot accept its predecessor's output.
    pub fn output_shapes(&self) -> Result<Vec<LayerShape>> {
        let mut current = self.input_shape()?;
        let mut shapes = Vec::with_capacity(self.layers.len());
        for (index, layer) in self.layers.iter().enumerate() {
            if index > 0 && matches!(layer, Layer::Input(_)) {
                return Err(NeuralNetError::ShapeMismatch {
                    index,
                    layer: layer.name(),
                    message: "an input layer may only appear first".to_string(),
                });
            }
            current = layer.output_shape(current).map_err(|message| NeuralNetError::ShapeMismatch {
                index,
                layer: layer.name(),
                message,
            })?;
            shapes.push(current);
        }
        Ok(shapes)
    }

    /// Binds every layer to its input shape and `batch_size`, drawing weights
    /// from `rng`. Shapes are validated before any layer is touched.
    pub fn initialize<R: Rng + ?Sized>(&mut self, batch_size: usize, rng: &mut R) -> Result<()> {
        if batch_size == 0 {
            return Err(NeuralNetError::InvalidConfiguration("batch size must be at least 1".to_string()));
        }
        self.output_shapes()?;

        let mut current = self.input_shape()?;
        let mut shapes = Vec::with_capacity(self.layers.len());
        for (index, layer) in self.layers.iter_mut().enumerate() {
            current = layer.initialize(current, batch_size, rng).map_err(|message| {
                NeuralNetError::ShapeMismatch { index, layer: layer.name(), message }
            })?;
            debug!("layer {index} {} -> {current}", layer.name());
            shapes.push(current);
        }
        self.shapes = shapes;
        self.batch_size = batch_size;
        Ok(())
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Reallocates the batch buffers of every layer, keeping weights.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        for layer in &mut self.layers {
            layer.set_batch_size(batch_size);
        }
        self.batch_size = batch_size;
    }

    /// Number of values the last layer emits per sample (0 before initialize).
    pub fn output_units(&self) -> usize {
        self.shapes.last().map_or(0, |s| s.units())
    }

    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Feeds the loss gradient through the layers in reverse order and
    /// returns the gradient with respect to the network input.
    pub fn backward(&mut self, output_gradient: &Matrix) -> Matrix {
        let mut current = output_gradient.clone();
        for layer in self.layers.iter_mut().rev() {
            current = layer.backward(&current);
        }
        current
    }

    pub fn predict(&self, input: &Matrix) -> Matrix {
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.predict(&current);
        }
        current
    }

    /// Flat list of every trainable tensor and its gradient, in layer order.
    pub fn parameters_and_gradients(&mut self) -> Vec<ParametersAndGradients<'_>> {
        let mut collector = Vec::new();
        for layer in &mut self.layers {
            layer.add_parameters_and_gradients(&mut collector);
        }
        collector
    }

    fn require_head(&self, expected: &'static str, check: fn(&Layer) -> bool) -> Result<()> {
        match self.layers.last() {
            Some(layer) if check(layer) => Ok(()),
            Some(layer) => Err(NeuralNetError::MissingCapability { expected, actual: layer.name() }),
            None => Err(NeuralNetError::MissingCapability { expected, actual: "empty network" }),
        }
    }

    pub fn require_classification(&self) -> Result<()> {
        self.require_head("classification", Layer::is_classification_head)
    }

    pub fn require_regression(&self) -> Result<()> {
        self.require_head("regression", Layer::is_regression_head)
    }

    /// Batch-size-1 copy of the network for inference.
    pub fn copy_for_prediction(&self) -> NeuralNet {
        NeuralNet {
            layers: self.layers.iter().map(Layer::copy_for_prediction).collect(),
            batch_size: 1,
            shapes: self.shapes.clone(),
        }
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<NeuralNet> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let mut net: NeuralNet = serde_json::from_reader(reader)?;
        // training caches are not persisted
        let batch_size = net.batch_size.max(1);
        net.set_batch_size(batch_size);
        Ok(net)
    }
}
