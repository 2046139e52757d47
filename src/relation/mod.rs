mod resolver;

pub(crate) use resolver::resolve;
