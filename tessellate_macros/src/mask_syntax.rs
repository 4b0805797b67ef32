use proc_macro2::{Ident, Span};
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{Attribute, Error, Expr, ExprArray, Result, Token, Type, Visibility};

/// Highest supported mask rank.
const MAX_RANK: usize = 4;

/// One kernel definition: `#[attrs] pub mod name: T = [[...], ...];`
///
/// The mask literal is a nested array. The outermost array runs along the
/// highest dimension and the innermost one along dimension 0, so that the
/// weights read in textual order are in linear offset order.
pub struct KernelDefinition {
    pub attrs: Vec<Attribute>,
    pub vis: Visibility,
    pub ident: Ident,
    pub ty: Type,
    /// Mask extent, dimension 0 first.
    pub extent: Vec<usize>,
    /// Mask weights in linear offset order.
    pub weights: Vec<Expr>,
}

impl Parse for KernelDefinition {
    fn parse(input: ParseStream) -> Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis = input.parse()?;
        input.parse::<Token![mod]>()?;
        let ident = input.parse()?;
        input.parse::<Token![:]>()?;
        let ty = input.parse()?;
        input.parse::<Token![=]>()?;
        let mask: ExprArray = input.parse()?;
        input.parse::<Token![;]>()?;

        let mut extent = Vec::new();
        let mut weights = Vec::new();
        flatten(&mask, 0, &mut extent, &mut weights)?;
        extent.reverse();

        if extent.len() > MAX_RANK {
            return Err(Error::new(
                mask.span(),
                format!("mask rank must be at most {}, got {}", MAX_RANK, extent.len()),
            ));
        }

        if let Some(even) = extent.iter().find(|e| **e % 2 == 0) {
            return Err(Error::new(
                mask.span(),
                format!("mask extents must be odd, got an extent of {}", even),
            ));
        }

        Ok(KernelDefinition {
            attrs,
            vis,
            ident,
            ty,
            extent,
            weights,
        })
    }
}

/// Records the length of each nesting level in `extent` (outermost first)
/// and pushes the leaves to `weights` in textual order.
fn flatten(array: &ExprArray, depth: usize, extent: &mut Vec<usize>, weights: &mut Vec<Expr>) -> Result<()> {
    let len = array.elems.len();
    if len == 0 {
        return Err(Error::new(array.span(), "mask arrays must not be empty"));
    }

    match extent.get(depth) {
        Some(expected) if *expected != len => {
            return Err(Error::new(
                array.span(),
                format!("ragged mask: expected {} elements, got {}", expected, len),
            ))
        }
        Some(_) => {}
        None => extent.push(len),
    }

    let nested = matches!(array.elems[0], Expr::Array(_));
    for elem in array.elems.iter() {
        match elem {
            Expr::Array(inner) if nested => flatten(inner, depth + 1, extent, weights)?,
            leaf if !nested && depth + 1 == extent.len() => weights.push(leaf.clone()),
            other => return Err(Error::new(other.span(), "ragged mask: nesting depths differ")),
        }
    }

    Ok(())
}

/// Sequence of kernel definitions, consumed until the end of the input.
pub struct KernelSequence(pub Vec<KernelDefinition>);

impl Parse for KernelSequence {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut kernels = Vec::new();
        while !input.is_empty() {
            kernels.push(input.parse()?);
        }

        if kernels.is_empty() {
            return Err(Error::new(Span::call_site(), "expected at least one kernel definition"));
        }

        Ok(KernelSequence(kernels))
    }
}
