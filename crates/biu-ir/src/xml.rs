//! Structural XML for the engine: a small element tree and a canonical printer.
//!
//! The printer is deterministic: attribute order is insertion order, children
//! are printed in order, indentation is two spaces. The same tree always
//! renders to the same bytes.

use crate::model::{DsMode, Layer, Network, NetworkDefaults, NeuronParams};

/// Root network-type declaration
pub const NETWORK_TYPE: &str = "BIUNetwork";

/// An XML element with attributes and either text or children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name
    pub tag: String,
    /// Attributes in print order
    pub attrs: Vec<(String, String)>,
    /// Text content (leaf elements)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
}

impl Element {
    /// Empty element
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Leaf element holding text
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut el = Self::new(tag);
        el.text = Some(text.into());
        el
    }

    /// Add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.attrs.push((key.into(), val.into()));
        self
    }

    /// Append a child
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append a leaf child only when a value is present
    pub fn push_opt(&mut self, tag: &str, value: Option<String>) {
        if let Some(v) = value {
            self.children.push(Element::leaf(tag, v));
        }
    }

    /// First child with the given tag
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Render as a complete document with XML declaration
    pub fn to_document(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        Self::print(&mut out, self, 0);
        out
    }

    fn print(out: &mut String, el: &Element, indent: usize) {
        for _ in 0..indent {
            out.push(' ');
        }
        out.push('<');
        out.push_str(&el.tag);
        for (k, v) in &el.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v));
            out.push('"');
        }

        match (&el.text, el.children.is_empty()) {
            (None, true) => out.push_str(" />\n"),
            (Some(text), true) => {
                out.push('>');
                out.push_str(&escape(text));
                out.push_str("</");
                out.push_str(&el.tag);
                out.push_str(">\n");
            }
            (_, false) => {
                out.push_str(">\n");
                for child in &el.children {
                    Self::print(out, child, indent + 2);
                }
                for _ in 0..indent {
                    out.push(' ');
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push_str(">\n");
            }
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shortest round-trip text for a number, without a trailing `.0`
pub fn format_number(v: f64) -> String {
    let s = format!("{:?}", v);
    match s.strip_suffix(".0") {
        Some(trimmed) => trimmed.to_string(),
        None => s,
    }
}

fn num(v: Option<f64>) -> Option<String> {
    v.map(format_number)
}

fn int(v: Option<u32>) -> Option<String> {
    v.map(|i| i.to_string())
}

fn push_analog_defaults(biu: &mut Element, d: &NetworkDefaults) {
    biu.push_opt("VTh", num(d.threshold));
    biu.push_opt("RLeak", num(d.leak));
    biu.push_opt("refractory", int(d.refractory));
    biu.push_opt("VDD", num(d.vdd));
    biu.push_opt("Cn", num(d.cn));
    biu.push_opt("Cu", num(d.cu));
    biu.push_opt("fclk", num(d.fclk));
}

fn push_params(el: &mut Element, p: &NeuronParams) {
    el.push_opt("VTh", num(p.threshold));
    el.push_opt("RLeak", num(p.leak));
    el.push_opt("refractory", int(p.refractory));
}

fn layer_element(layer: &Layer) -> Element {
    let mut l_el = Element::new("Layer").with_attr("size", layer.size.to_string());

    let mut syn = Element::new("synapses")
        .with_attr("rows", layer.synapses.rows.to_string())
        .with_attr("cols", layer.synapses.cols.to_string());
    let mut weights = Element::new("weights");
    for row in &layer.synapses.weights {
        let text = row.iter().map(|v| format_number(*v)).collect::<Vec<_>>().join(" ");
        weights.push(Element::leaf("row", text));
    }
    syn.push(weights);
    l_el.push(syn);

    for r in &layer.ranges {
        let mut r_el = Element::new("NeuronRange")
            .with_attr("start", r.start.to_string())
            .with_attr("end", r.end.to_string());
        push_params(&mut r_el, &r.params);
        l_el.push(r_el);
    }

    // Single-neuron overrides go last, they are the most specific
    for n in &layer.neurons {
        let mut n_el = Element::new("Neuron").with_attr("index", n.index.to_string());
        push_params(&mut n_el, &n.params);
        l_el.push(n_el);
    }
    l_el
}

/// Structural description of a whole network. `mode` is the already-resolved
/// digital-interface mode; the declared string on `network.defaults` is ignored.
pub fn network_document(network: &Network, mode: DsMode) -> Element {
    let d = &network.defaults;
    let mut root = Element::new("NetworkConfig").with_attr("type", NETWORK_TYPE);

    let mut biu = Element::new(NETWORK_TYPE);
    push_analog_defaults(&mut biu, d);
    biu.push_opt("DSClockMHz", num(d.ds_clock_mhz));
    biu.push_opt("DSBitWidth", int(d.ds_bit_width));
    biu.push(Element::leaf("DSMode", mode.as_str()));
    root.push(biu);

    let mut arch = Element::new("Architecture");
    for layer in &network.layers {
        arch.push(layer_element(layer));
    }
    root.push(arch);
    root
}

/// Defaults-only document (secondary defaults file). Digital-interface
/// fields are not part of this schema subset.
pub fn defaults_document(defaults: &NetworkDefaults) -> Element {
    let mut root = Element::new("NetworkConfig").with_attr("type", NETWORK_TYPE);
    let mut biu = Element::new(NETWORK_TYPE);
    push_analog_defaults(&mut biu, defaults);
    root.push(biu);
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SynapseMatrix;

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(0.9), "0.9");
        assert_eq!(format_number(520e6), "520000000");
        assert_eq!(format_number(1e-12), "1e-12");
        assert_eq!(format_number(-0.25), "-0.25");
    }

    #[test]
    fn escapes_attribute_and_text() {
        let el = Element::leaf("a", "x<y & z").with_attr("k", "\"q\"");
        let doc = el.to_document();
        assert!(doc.contains("<a k=\"&quot;q&quot;\">x&lt;y &amp; z</a>"));
    }

    #[test]
    fn prints_minimal_network() {
        let net = Network::new(NetworkDefaults {
            threshold: Some(0.9),
            ..NetworkDefaults::default()
        })
        .with_layer(
            Layer::new(1, SynapseMatrix::from_rows(vec![vec![7.0]]))
                .with_range(0, 0, NeuronParams::threshold(0.5))
                .with_neuron(0, NeuronParams::default().with_refractory(3)),
        );
        let doc = network_document(&net, DsMode::ThresholdMode).to_document();
        let expected = r#"<?xml version="1.0" encoding="utf-8"?>
<NetworkConfig type="BIUNetwork">
  <BIUNetwork>
    <VTh>0.9</VTh>
    <DSMode>ThresholdMode</DSMode>
  </BIUNetwork>
  <Architecture>
    <Layer size="1">
      <synapses rows="1" cols="1">
        <weights>
          <row>7</row>
        </weights>
      </synapses>
      <NeuronRange start="0" end="0">
        <VTh>0.5</VTh>
      </NeuronRange>
      <Neuron index="0">
        <refractory>3</refractory>
      </Neuron>
    </Layer>
  </Architecture>
</NetworkConfig>
"#;
        assert_eq!(doc, expected);
    }

    #[test]
    fn supervisor_document_has_no_digital_fields() {
        let doc = defaults_document(&NetworkDefaults::supervisor()).to_document();
        assert!(doc.contains("<fclk>10000000</fclk>"));
        assert!(doc.contains("<Cu>4e-15</Cu>"));
        assert!(!doc.contains("DSMode"));
    }
}
