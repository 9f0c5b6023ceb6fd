mod directory_loader_test;
