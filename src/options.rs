//! Configuration for parsing, encoding, pooling and binding.
//!
//! All options are plain structs with a `Default` and `const` builder methods.

/// Options for [`Parser`](crate::Parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum container nesting. Opening a container beyond this depth is a
    /// parse error at the opening bracket.
    pub max_depth: usize,
}

impl ParseOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 512;

    pub const fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for [`Encoder`](crate::Encoder).
///
/// # Example
///
/// ```
/// use na_json::EncodeOptions;
///
/// let opts = EncodeOptions::new().indent("\t").escape_html(true);
/// assert!(opts.is_pretty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    /// Indentation unit. `Some` selects pretty rendering.
    pub indent: Option<&'static str>,
    /// Additionally escape `<`, `>` and `&` as `\u003c`, `\u003e`, `\u0026`.
    pub escape_html: bool,
}

impl EncodeOptions {
    pub const fn new() -> Self {
        Self {
            indent: None,
            escape_html: false,
        }
    }

    /// Pretty rendering with two-space indentation.
    pub const fn pretty() -> Self {
        Self::new().indent("  ")
    }

    pub const fn indent(mut self, indent: &'static str) -> Self {
        self.indent = Some(indent);
        self
    }

    pub const fn escape_html(mut self, escape_html: bool) -> Self {
        self.escape_html = escape_html;
        self
    }

    #[inline]
    pub const fn is_pretty(&self) -> bool {
        self.indent.is_some()
    }
}

/// Options for [`Pools`](crate::Pools).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Capacity of each pooled node array.
    pub node_array_capacity: usize,
    /// Upper bound on idle items kept by each pool.
    pub max_retained: usize,
}

impl PoolConfig {
    pub const DEFAULT_NODE_ARRAY_CAPACITY: usize = 1024;
    pub const DEFAULT_MAX_RETAINED: usize = 64;
    /// Length of encoder scratch buffers. Not configurable.
    pub const SCRATCH_LEN: usize = 255;

    pub const fn new() -> Self {
        Self {
            node_array_capacity: Self::DEFAULT_NODE_ARRAY_CAPACITY,
            max_retained: Self::DEFAULT_MAX_RETAINED,
        }
    }

    pub const fn node_array_capacity(mut self, capacity: usize) -> Self {
        self.node_array_capacity = capacity;
        self
    }

    pub const fn max_retained(mut self, max_retained: usize) -> Self {
        self.max_retained = max_retained;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for [`Binder`](crate::Binder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindOptions {
    pub parse: ParseOptions,
}

impl BindOptions {
    pub const fn new() -> Self {
        Self {
            parse: ParseOptions::new(),
        }
    }

    pub const fn parse(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }
}
