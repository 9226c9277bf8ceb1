mod elapsed;
mod lifecycle;
