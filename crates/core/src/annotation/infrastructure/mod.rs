pub mod rgb_canvas;
