extern crate proc_macro;
use proc_macro::TokenStream;
use proc_macro2::{Literal, Span, TokenStream as TokenStream2};

use quote::quote;
use syn::visit_mut::VisitMut;
use syn::{parse_macro_input, Ident, ItemImpl};

mod substitution_syntax;
use substitution_syntax::*;

mod mask_syntax;
use mask_syntax::*;

mod search_replace;
use search_replace::*;

/// Duplicates an impl block once per `Generic = Type` substitution given as
/// attribute, removing the generic parameter and substituting the type.
///
/// ```ignore
/// #[expand_impl(T = f64, T = f32)]
/// impl<T> Ring for T {
///     const ZERO: T = 0.0;
///     const ONE: T = 1.0;
/// }
/// ```
#[proc_macro_attribute]
pub fn expand_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let substitutions = parse_macro_input!(attr as SubstitutionSequence);
    let item = parse_macro_input!(item as ItemImpl);

    let mut impl_blocks = Vec::new();

    for substitution in substitutions.iter() {
        let mut impl_block = item.clone();

        let mut generics_visitor = RemoveGenerics {
            find: substitution.ident.clone(),
        };
        let mut type_visitor = FindReplaceType {
            find: substitution.ident.clone(),
            replace: substitution.ty.clone(),
        };
        generics_visitor.visit_item_impl_mut(&mut impl_block);
        type_visitor.visit_item_impl_mut(&mut impl_block);

        impl_blocks.push(impl_block);
    }

    let result = quote! {
        #(#impl_blocks)*
    };
    result.into()
}

/// Generates a stencil kernel family for each fixed mask.
///
/// ```ignore
/// conv_kernel! {
///     /// 3x3 box blur.
///     pub mod box_blur: f32 = [
///         [1.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0],
///         [1.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0],
///         [1.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0],
///     ];
/// }
/// ```
///
/// Each definition expands to a module holding a `Mask` type implementing
/// `tessellate::stencil::ConvMask` and the launch functions `conv_global`,
/// `conv_block`, `conv_block_into`, `conv_block_crack` and
/// `conv_block_crack_into` specialised for that mask. The outermost array
/// of the literal runs along the highest dimension. Masks must have rank 1
/// to 4 and odd extents.
#[proc_macro]
pub fn conv_kernel(input: TokenStream) -> TokenStream {
    let kernels = parse_macro_input!(input as KernelSequence);

    let modules = kernels.0.iter().map(kernel_module);

    let result = quote! {
        #(#modules)*
    };
    result.into()
}

fn kernel_module(kernel: &KernelDefinition) -> TokenStream2 {
    let KernelDefinition {
        attrs,
        vis,
        ident,
        ty,
        extent,
        weights,
    } = kernel;

    let rank = Literal::usize_unsuffixed(extent.len());
    let name = ident.to_string();
    let shape_alias = Ident::new(&format!("Shape{}D", extent.len()), Span::call_site());
    let dims = extent
        .iter()
        .map(|e| Ident::new(&format!("U{}", e), Span::call_site()));

    quote! {
        #(#attrs)*
        #vis mod #ident {
            #[allow(unused_imports)]
            use super::*;

            use ::tessellate::device::DeviceTensor;
            use ::tessellate::point::Point;
            use ::tessellate::tensor::expression::TensorExpr;
            use ::tessellate::tensor::lambda_tensor::LambdaTensor;
            use ::tessellate::tensor::policy::{ArrayAccess, Device, DeviceVisible};
            use ::tessellate::tensor::shape::{NumElements, StaticExtent};

            /// Fixed weights of this stencil.
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct Mask;

            impl ::tessellate::stencil::ConvMask for Mask {
                type Value = #ty;
                type Shape = ::tessellate::tensor::shape::#shape_alias<#(::tessellate::typenum::#dims),*>;

                const NAME: &'static str = #name;
                const WEIGHTS: &'static [#ty] = &[#(#weights),*];
            }

            /// Unblocked convolution, evaluated lazily on device.
            pub fn conv_global<V>(input: V) -> LambdaTensor<impl Fn(Point<#rank>) -> #ty + Sync, ArrayAccess, #rank, Device>
            where
                V: TensorExpr<Value = #ty, Index = Point<#rank>> + Sync,
                V::Memory: DeviceVisible,
            {
                ::tessellate::stencil::conv_global::<Mask, V, #rank>(input)
            }

            /// Tiled convolution with halo staging.
            pub fn conv_block<B>(input: &DeviceTensor<#ty, #rank>) -> ::tessellate::Result<DeviceTensor<#ty, #rank>>
            where
                B: StaticExtent<Index = Point<#rank>>,
            {
                ::tessellate::stencil::conv_block::<Mask, B, #rank>(input)
            }

            pub fn conv_block_into<B>(input: &DeviceTensor<#ty, #rank>, output: &DeviceTensor<#ty, #rank>) -> ::tessellate::Result<()>
            where
                B: StaticExtent<Index = Point<#rank>>,
            {
                ::tessellate::stencil::conv_block_into::<Mask, B, #rank>(input, output)
            }

            /// Tiled convolution without halo, block seams are not written.
            pub fn conv_block_crack<B>(input: &DeviceTensor<#ty, #rank>) -> ::tessellate::Result<DeviceTensor<#ty, #rank>>
            where
                B: StaticExtent<Index = Point<#rank>> + NumElements<#ty>,
            {
                ::tessellate::stencil::conv_block_crack::<Mask, B, #rank>(input)
            }

            pub fn conv_block_crack_into<B>(input: &DeviceTensor<#ty, #rank>, output: &DeviceTensor<#ty, #rank>) -> ::tessellate::Result<()>
            where
                B: StaticExtent<Index = Point<#rank>> + NumElements<#ty>,
            {
                ::tessellate::stencil::conv_block_crack_into::<Mask, B, #rank>(input, output)
            }
        }
    }
}
