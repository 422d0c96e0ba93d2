mod generation;
