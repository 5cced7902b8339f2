//! Tests for autograd operations with gradient checking

mod prop_conv;
mod prop_softmax;
mod test_utils;
